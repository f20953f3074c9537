//! Chart script isolation
//!
//! Every slide's chart script ends up in the same document, so top-level
//! `const ctx = ...` declarations would collide and canvases would be looked
//! up globally. Each script is rewritten and registered as an initializer
//! that the slide manager runs when its slide is shown.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::template::{ChartContext, TemplateError, TemplateLoader};

static HORIZONTAL_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(type\s*:\s*)['"]horizontalBar['"]"#).expect("horizontal type regex is valid")
});

static HORIZONTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhorizontalBar\b").expect("horizontal regex is valid"));

static GET_BY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:window\s*\.\s*)?document\s*\.\s*getElementById\s*\(").expect("getElementById regex is valid"));

static READY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:document|window)\s*\.\s*addEventListener\s*\(\s*['"](?:DOMContentLoaded|load)['"]\s*,\s*"#)
        .expect("ready regex is valid")
});

/// Inline script that draws charts
pub fn is_chart_script(script: &str) -> bool {
    script.contains("Chart") || script.contains("ctx") || script.to_lowercase().contains("canvas")
}

/// Rewrite a chart script so it can run inside a slide initializer
///
/// - `horizontalBar` charts become `bar` charts with `indexAxis: 'y'`
/// - `document.getElementById(..)` resolves inside the slide first
/// - load listeners run immediately, since the page has loaded by the time
///   a slide is shown
pub fn rewrite_chart_script(script: &str) -> String {
    let horizontal = if script.contains("indexAxis") {
        "${1}'bar'"
    } else {
        "${1}'bar', indexAxis: 'y'"
    };
    let out = HORIZONTAL_TYPE_RE.replace_all(script, horizontal);
    let out = HORIZONTAL_RE.replace_all(&out, "bar");
    let out = GET_BY_ID_RE.replace_all(&out, "__byId(");
    let out = READY_RE.replace_all(&out, "__ready(");
    out.into_owned()
}

/// Wrap a chart script as the initializer of `slide_id`
pub fn isolate_chart_script(loader: &TemplateLoader, script: &str, slide_id: &str) -> Result<String, TemplateError> {
    debug!(%slide_id, len = script.len(), "isolate_chart_script: called");
    loader.render_chart_init(&ChartContext {
        slide_id: slide_id.to_string(),
        body: rewrite_chart_script(script),
    })
}
