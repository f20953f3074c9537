//! Embedded templates
//!
//! These are compiled into the binary from the crate's `templates/` directory.

use tracing::debug;

/// Single-slide HTML skeleton with the five slide tokens
pub const SLIDE: &str = include_str!("../../templates/slide.hbs");

/// Theme stylesheet, every rule scoped under `.genspark-slide`
pub const THEME_CSS: &str = include_str!("../../templates/theme.css");

/// Offline presentation document wrapping all bundled slides
pub const PRESENTER: &str = include_str!("../../templates/presenter.hbs");

/// Chrome for the presentation document (controls, slide stacking)
pub const PRESENTER_CSS: &str = include_str!("../../templates/presenter.css");

/// Navigation, chart lifecycle and code highlighting for the presentation
pub const SLIDE_MANAGER_JS: &str = include_str!("../../templates/slide-manager.js");

/// Wrapper that turns a slide's chart script into a registered initializer
pub const CHART_INIT: &str = include_str!("../../templates/chart-init.hbs");

/// Get the embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "slide" => Some(SLIDE),
        "theme" => Some(THEME_CSS),
        "presenter" => Some(PRESENTER),
        "presenter-css" => Some(PRESENTER_CSS),
        "slide-manager" => Some(SLIDE_MANAGER_JS),
        "chart-init" => Some(CHART_INIT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

/// File name a template is looked up under on disk
pub fn file_name(name: &str) -> String {
    match name {
        "theme" => "theme.css".to_string(),
        "presenter-css" => "presenter.css".to_string(),
        "slide-manager" => "slide-manager.js".to_string(),
        other => format!("{}.hbs", other),
    }
}
