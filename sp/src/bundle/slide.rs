//! Turning one exported document into a presentation slide

use tracing::debug;

use super::charts::{is_chart_script, isolate_chart_script};
use super::inline::{collect_cdn_urls, inline_resources};
use super::snippets::process_code_snippets;
use crate::dom::{Element, parse_document};
use crate::fetch::{CdnFilter, DownloadReport};
use crate::template::{SCOPE_CLASS, TemplateError, TemplateLoader};

/// A slide between parsing and serialisation
///
/// Code snippets are normalised on parse so CDN references can be collected
/// from every slide before anything is downloaded.
#[derive(Debug, Clone)]
pub struct Slide {
    pub index: usize,
    pub root: Element,
    pub code_blocks: usize,
}

/// A finished slide and what was done to it
#[derive(Debug, Clone)]
pub struct ProcessedSlide {
    pub html: String,
    pub code_blocks: usize,
    pub inlined: usize,
    pub charts: usize,
}

impl Slide {
    pub fn parse(html: &str, index: usize) -> Self {
        debug!(index, len = html.len(), "Slide::parse: called");
        let mut root = parse_document(html);
        let code_blocks = process_code_snippets(&mut root);
        Self {
            index,
            root,
            code_blocks,
        }
    }

    /// `slide-N`, 0-based
    pub fn id(&self) -> String {
        format!("slide-{}", self.index)
    }

    pub fn cdn_urls(&self, filter: &CdnFilter) -> Vec<String> {
        collect_cdn_urls(&self.root, filter)
    }

    /// Inline resources, isolate chart scripts and turn the document into a `div`
    pub fn finish(mut self, loader: &TemplateLoader, resources: &DownloadReport) -> Result<ProcessedSlide, TemplateError> {
        let id = self.id();
        debug!(%id, "Slide::finish: called");

        let inlined = inline_resources(&mut self.root, resources);
        let charts = isolate_charts(&mut self.root, loader, &id)?;
        restructure(&mut self.root, &id);

        Ok(ProcessedSlide {
            html: self.root.to_html(),
            code_blocks: self.code_blocks,
            inlined,
            charts,
        })
    }
}

/// Parse and finish a slide in one step
pub fn process_slide(
    html: &str,
    index: usize,
    loader: &TemplateLoader,
    resources: &DownloadReport,
) -> Result<ProcessedSlide, TemplateError> {
    Slide::parse(html, index).finish(loader, resources)
}

/// Wrap every inline chart script; inlined libraries are left alone
fn isolate_charts(root: &mut Element, loader: &TemplateLoader, slide_id: &str) -> Result<usize, TemplateError> {
    let mut count = 0;
    let mut failure = None;
    root.visit_mut(&mut |el, _| {
        if failure.is_some()
            || el.name != "script"
            || el.attr("src").is_some()
            || el.attr("data-original-url").is_some()
        {
            return;
        }
        let script = el.text();
        if script.trim().is_empty() || !is_chart_script(&script) {
            return;
        }
        match isolate_chart_script(loader, &script, slide_id) {
            Ok(wrapped) => {
                el.set_text(wrapped);
                count += 1;
            }
            Err(e) => failure = Some(e),
        }
    });

    match failure {
        Some(e) => Err(e),
        None => {
            debug!(%slide_id, count, "isolate_charts: done");
            Ok(count)
        }
    }
}

/// `<html>` → `div.genspark-slide#slide-N`, `<head>` → hidden `div.slide-head`,
/// `<body>` → `div.slide-body`
fn restructure(root: &mut Element, slide_id: &str) {
    root.name = "div".to_string();
    root.set_attr("id", slide_id);
    root.add_class(SCOPE_CLASS.trim_start_matches('.'));
    root.set_attr("style", "display: none;");

    for child in root.child_elements_mut() {
        match child.name.as_str() {
            "head" => {
                child.name = "div".to_string();
                child.set_attr("class", "slide-head");
                child.set_attr("style", "display: none;");
            }
            "body" => {
                child.name = "div".to_string();
                child.add_class("slide-body");
            }
            _ => {}
        }
    }
}
