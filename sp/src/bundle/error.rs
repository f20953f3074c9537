//! Bundle error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("No slides found: the input must contain documents starting with <html>")]
    NoSlides,

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("No input matches '{0}'")]
    NoMatch(String),
}
