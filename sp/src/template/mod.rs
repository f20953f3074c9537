//! Slide Template System
//!
//! The slide template is an HTML skeleton with five insertion points
//! (`{{SLIDE_TITLE}}`, `{{SLIDE_SUBTITLE}}`, `{{SLIDE_CONTENT}}`,
//! `{{SLIDE_FOOTER}}`, `{{SLIDE_ID}}`) and a theme stylesheet scoped under
//! `.genspark-slide`.
//!
//! Template loading chain:
//! 1. `<template-dir>/{name}.hbs` (user override, `.slidepack/templates` by default)
//! 2. `templates/{name}.hbs` (repo default)
//! 3. Embedded fallback in code

pub mod deck;
pub mod embedded;
mod error;
mod loader;
pub mod theme;
mod tokens;

pub use deck::{Deck, DeckSlide, render_deck};
pub use error::TemplateError;
pub use loader::{ChartContext, PresenterContext, TemplateLoader};
pub use theme::{SCOPE_CLASS, scope_violations};
pub use tokens::{SlideFields, SlideToken, TokenScan, check_template, is_valid_slide_id, scan_tokens};
