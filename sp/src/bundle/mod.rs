//! Offline bundling
//!
//! Turns an exported file of concatenated slide documents into one
//! self-contained HTML presentation: CDN stylesheets, scripts and fonts are
//! inlined, chart scripts are isolated per slide, and every slide becomes a
//! `div.genspark-slide` driven by the embedded slide manager.

mod assemble;
mod charts;
mod converter;
mod error;
mod inline;
mod slide;
mod snippets;
mod split;

pub use assemble::{AssembleOptions, assemble};
pub use charts::{is_chart_script, isolate_chart_script, rewrite_chart_script};
pub use converter::{ConversionReport, Converter, expand_inputs, resolve_paths};
pub use error::BundleError;
pub use inline::{collect_cdn_urls, inline_resources};
pub use slide::{ProcessedSlide, Slide, process_slide};
pub use snippets::{dedent, process_code_snippets};
pub use split::{deck_title, split_slides};
