//! Presentation document assembly

use tracing::{debug, warn};

use super::inline::{script_safe, style_safe};
use crate::config::EssentialsConfig;
use crate::fetch::DownloadReport;
use crate::fetch::fonts::embed_webfonts;
use crate::template::{PresenterContext, TemplateError, TemplateLoader};

/// Document-level settings for [`assemble`]
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub title: String,
    pub lang: String,
    /// Include the slide theme stylesheet
    pub embed_theme: bool,
}

/// Render the single-file presentation around already processed slides
///
/// Essentials that failed to download are simply left out; the slide
/// manager feature-detects highlight.js.
pub fn assemble(
    loader: &TemplateLoader,
    slides: &[String],
    resources: &DownloadReport,
    essentials: &EssentialsConfig,
    options: &AssembleOptions,
) -> Result<String, TemplateError> {
    debug!(slides = slides.len(), title = %options.title, "assemble: called");

    let text_of = |url: &str| {
        let text = resources.get(url).map(|r| r.text().into_owned());
        if text.is_none() && !url.is_empty() {
            warn!(%url, "Essential resource unavailable, leaving it out");
        }
        text
    };

    let fonts: Vec<_> = essentials
        .fontawesome_webfonts
        .iter()
        .filter_map(|url| resources.get(url).cloned())
        .collect();
    let fontawesome_css = text_of(&essentials.fontawesome_css).map(|css| style_safe(&embed_webfonts(&css, &fonts)));

    let theme_css = if options.embed_theme {
        Some(loader.theme_css()?)
    } else {
        None
    };

    let ctx = PresenterContext {
        title: options.title.clone(),
        lang: options.lang.clone(),
        version: env!("GIT_DESCRIBE").to_string(),
        fontawesome_css,
        highlight_css: text_of(&essentials.highlight_css).map(|css| style_safe(&css)),
        highlight_js: text_of(&essentials.highlight_js).map(|js| script_safe(&js)),
        theme_css,
        presenter_css: loader.load_template("presenter-css")?,
        manager_js: loader.load_template("slide-manager")?,
        slides: slides.join("\n"),
        slide_count: slides.len(),
    };

    loader.render_presenter(&ctx)
}
