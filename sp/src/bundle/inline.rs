//! Collecting CDN references and replacing them with inline content

use std::sync::LazyLock;

use assetcache::AssetKind;
use regex::{NoExpand, Regex};
use tracing::debug;

use crate::dom::{Element, Node};
use crate::fetch::{CdnFilter, DownloadReport};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("import regex is valid")
});

static SCRIPT_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(script)").expect("script end regex is valid"));

static STYLE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(style)").expect("style end regex is valid"));

/// Downloadable URLs referenced by `<link href>`, `<script src>` and `@import url(...)`
///
/// In document order, without duplicates.
pub fn collect_cdn_urls(root: &Element, filter: &CdnFilter) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        if filter.is_downloadable(url) && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    };

    root.walk(&mut |el| match el.name.as_str() {
        "link" => {
            if let Some(href) = el.attr("href") {
                push(href);
            }
        }
        "script" => {
            if let Some(src) = el.attr("src") {
                push(src);
            }
        }
        "style" => {
            for cap in IMPORT_RE.captures_iter(&el.text()) {
                push(cap[1].trim());
            }
        }
        _ => {}
    });

    debug!(count = urls.len(), "collect_cdn_urls: done");
    urls
}

/// Replace downloaded stylesheets and scripts with inline copies, returning the count
///
/// References whose download failed are left untouched.
pub fn inline_resources(root: &mut Element, report: &DownloadReport) -> usize {
    let mut count = 0;
    root.visit_mut(&mut |el, _| match el.name.as_str() {
        "link" => {
            let Some(href) = el.attr("href").map(str::to_string) else {
                return;
            };
            if let Some(css) = report.get(&href).filter(|r| r.kind == AssetKind::Css) {
                let media = el.attr("media").map(str::to_string);
                el.name = "style".to_string();
                el.attrs = vec![("data-original-url".to_string(), href)];
                if let Some(media) = media {
                    el.set_attr("media", media);
                }
                el.children = vec![Node::Text(style_safe(&css.text()))];
                count += 1;
            }
        }
        "script" => {
            let Some(src) = el.attr("src").map(str::to_string) else {
                return;
            };
            if let Some(js) = report.get(&src).filter(|r| r.kind == AssetKind::Js) {
                el.remove_attr("src");
                el.set_text(script_safe(&js.text()));
                el.set_attr("data-original-url", src);
                count += 1;
            }
        }
        "style" => {
            let css = el.text();
            let replaced = inline_imports(&css, report);
            if replaced != css {
                el.set_text(replaced);
                count += 1;
            }
        }
        _ => {}
    });
    debug!(count, "inline_resources: done");
    count
}

/// Escape end tags that would close an inline `<script>` early
pub(crate) fn script_safe(js: &str) -> String {
    SCRIPT_END_RE.replace_all(js, r"<\/$1").into_owned()
}

/// Escape end tags that would close an inline `<style>` early
pub(crate) fn style_safe(css: &str) -> String {
    STYLE_END_RE.replace_all(css, r"<\/$1").into_owned()
}

/// Replace `@import url(...)` of downloaded stylesheets with their content
fn inline_imports(css: &str, report: &DownloadReport) -> String {
    let mut out = css.to_string();
    for cap in IMPORT_RE.captures_iter(css) {
        let url = cap[1].trim();
        let Some(resource) = report.get(url).filter(|r| r.kind == AssetKind::Css) else {
            continue;
        };
        let pattern = format!(r#"@import\s+url\(\s*['"]?{}['"]?\s*\)\s*;?"#, regex::escape(url));
        if let Ok(re) = Regex::new(&pattern) {
            out = re.replace_all(&out, NoExpand(&style_safe(&resource.text()))).into_owned();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use crate::fetch::Resource;

    const CSS: &str = "https://cdn.jsdelivr.net/npm/a@1/a.css";
    const JS: &str = "https://cdn.jsdelivr.net/npm/chart.js";
    const FONT_CSS: &str = "https://fonts.googleapis.com/css2?family=Inter";

    fn report() -> DownloadReport {
        let mut report = DownloadReport::default();
        for (url, kind, body) in [
            (CSS, AssetKind::Css, ".a{color:red}"),
            (JS, AssetKind::Js, "var Chart = 1; // </script>"),
            (FONT_CSS, AssetKind::Css, "@font-face{font-family:Inter}"),
        ] {
            report.resources.insert(
                url.to_string(),
                Resource {
                    url: url.to_string(),
                    kind,
                    bytes: body.as_bytes().to_vec(),
                    cached: false,
                },
            );
        }
        report
    }

    fn slide() -> String {
        format!(
            r#"<html><head>
<link rel="stylesheet" href="{CSS}">
<link rel="stylesheet" href="local.css">
<script src="{JS}"></script>
<script src="https://unpkg.com/missing@1/x.js"></script>
<style>@import url('{FONT_CSS}'); body {{ margin: 0; }}</style>
</head><body><script>new Chart(ctx, {{}});</script></body></html>"#
        )
    }

    #[test]
    fn test_collect_cdn_urls() {
        let root = parse_document(&slide());
        let urls = collect_cdn_urls(&root, &CdnFilter::from_defaults().unwrap());
        assert_eq!(urls, vec![CSS, JS, "https://unpkg.com/missing@1/x.js", FONT_CSS]);
    }

    #[test]
    fn test_inline_resources() {
        let mut root = parse_document(&slide());
        assert_eq!(inline_resources(&mut root, &report()), 3);

        let html = root.to_html();
        assert!(html.contains(&format!(r#"<style data-original-url="{CSS}">.a{{color:red}}</style>"#)));
        assert!(html.contains(&format!(r#"<script data-original-url="{JS}">var Chart = 1; // <\/script></script>"#)));
        assert!(html.contains(r#"<link rel="stylesheet" href="local.css">"#));
        assert!(html.contains(r#"<script src="https://unpkg.com/missing@1/x.js"></script>"#));
        assert!(html.contains("<style>@font-face{font-family:Inter} body { margin: 0; }</style>"));
    }

    #[test]
    fn test_end_tags_are_escaped() {
        assert_eq!(script_safe("a = '</SCRIPT>'; b = '</script'"), r"a = '<\/SCRIPT>'; b = '<\/script'");
        assert_eq!(style_safe(r#"a::after { content: "</style>"; }"#), r#"a::after { content: "<\/style>"; }"#);
        assert_eq!(style_safe(".a{color:red}"), ".a{color:red}");
    }

    #[test]
    fn test_inlined_css_cannot_close_style() {
        let mut report = DownloadReport::default();
        report.resources.insert(
            CSS.to_string(),
            Resource {
                url: CSS.to_string(),
                kind: AssetKind::Css,
                bytes: b".a::after{content:'</style>'}".to_vec(),
                cached: false,
            },
        );
        let mut root = parse_document(&format!(
            r#"<head><link rel="stylesheet" href="{CSS}"><style>@import url("{CSS}");</style></head>"#
        ));
        assert_eq!(inline_resources(&mut root, &report), 2);

        let html = root.to_html();
        assert_eq!(html.matches("</style>").count(), 2);
        assert_eq!(html.matches(r"<\/style>").count(), 2);
    }

    #[test]
    fn test_import_forms() {
        let report = report();
        for css in [
            format!("@import url('{CSS}');"),
            format!("@import url(\"{CSS}\")"),
            format!("@import url({CSS});"),
        ] {
            assert_eq!(inline_imports(&css, &report), ".a{color:red}");
        }
    }
}
