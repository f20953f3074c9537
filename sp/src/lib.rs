//! slidepack - slide template, deck renderer and offline presentation bundler
//!
//! slidepack ships a fixed slide template with five insertion points and a
//! theme stylesheet scoped under `.genspark-slide`, renders YAML decks
//! through it, and bundles exported multi-slide HTML files into a single
//! offline presentation.
//!
//! # Modules
//!
//! - [`template`] - Slide template, tokens, theme and template loading
//! - [`fetch`] - CDN resource fetching with caching and bounded concurrency
//! - [`dom`] - Owned HTML tree used to rewrite slides
//! - [`bundle`] - Exported file to offline presentation conversion
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod bundle;
pub mod cli;
pub mod config;
pub mod dom;
pub mod fetch;
pub mod template;

// Re-export commonly used types
pub use bundle::{BundleError, ConversionReport, Converter, resolve_paths};
pub use config::Config;
pub use fetch::{Downloader, FetchError, Fetcher, HttpFetcher, OfflineFetcher};
pub use template::{Deck, SlideFields, SlideToken, TemplateError, TemplateLoader, render_deck};
