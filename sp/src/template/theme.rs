//! Theme stylesheet inspection
//!
//! A deliberately small CSS rule walker: enough to list style rules with the
//! media condition they sit under, so a theme can be checked for selectors
//! that escape the slide scope.

use tracing::debug;

/// Class every theme rule must be scoped under
pub const SCOPE_CLASS: &str = ".genspark-slide";

/// One rule of a stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    /// Condition of the enclosing `@media`/`@supports` blocks, joined with " and "
    pub media: Option<String>,
    /// Set for at-rules kept opaque (`@font-face`, `@keyframes`, `@import`, ...)
    pub at_rule: Option<String>,
    /// Comma-separated selectors of a style rule, trimmed
    pub selectors: Vec<String>,
    /// Declarations between the braces, trimmed
    pub body: String,
}

impl CssRule {
    pub fn is_style_rule(&self) -> bool {
        self.at_rule.is_none()
    }

    pub fn has_selector(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }
}

/// Parse a stylesheet into a flat list of rules
pub fn parse_rules(css: &str) -> Vec<CssRule> {
    let cleaned = strip_comments(css);
    let mut rules = Vec::new();
    walk(&cleaned, None, &mut rules);
    debug!(count = rules.len(), "parse_rules: done");
    rules
}

/// Selectors that do not start with `scope`, annotated with their media condition
pub fn scope_violations(css: &str, scope: &str) -> Vec<String> {
    parse_rules(css)
        .iter()
        .filter(|r| r.is_style_rule())
        .flat_map(|r| {
            r.selectors
                .iter()
                .filter(|s| !is_scoped(s, scope))
                .map(move |s| match &r.media {
                    Some(media) => format!("{} (in @media {})", s, media),
                    None => s.clone(),
                })
        })
        .collect()
}

fn is_scoped(selector: &str, scope: &str) -> bool {
    match selector.strip_prefix(scope) {
        Some(rest) => rest
            .chars()
            .next()
            .is_none_or(|c| matches!(c, ' ' | '.' | ':' | '>' | '[' | '#' | '+' | '~' | '\n' | '\t')),
        None => false,
    }
}

/// Drop `/* ... */` comments, leaving quoted strings alone
fn strip_comments(css: &str) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut pos = 0;
    let mut copied = 0;
    let mut quote: Option<u8> = None;

    while pos < bytes.len() {
        let b = bytes[pos];
        if let Some(q) = quote {
            if b == b'\\' {
                pos = (pos + 2).min(bytes.len());
                continue;
            }
            if b == q {
                quote = None;
            }
            pos += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => {
                quote = Some(b);
                pos += 1;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                out.push_str(&css[copied..pos]);
                pos = match css[pos + 2..].find("*/") {
                    Some(end) => pos + 2 + end + 2,
                    None => bytes.len(),
                };
                copied = pos;
            }
            _ => pos += 1,
        }
    }
    out.push_str(&css[copied..]);
    out
}

fn walk(css: &str, media: Option<&str>, rules: &mut Vec<CssRule>) {
    let bytes = css.as_bytes();
    let mut pos = 0;
    let mut prelude_start = 0;
    let mut quote: Option<u8> = None;

    while pos < bytes.len() {
        let b = bytes[pos];
        if let Some(q) = quote {
            if b == b'\\' {
                pos = (pos + 2).min(bytes.len());
                continue;
            }
            if b == q {
                quote = None;
            }
            pos += 1;
            continue;
        }

        match b {
            b'"' | b'\'' => quote = Some(b),
            b';' => {
                let prelude = css[prelude_start..pos].trim();
                if prelude.starts_with('@') {
                    rules.push(CssRule {
                        media: media.map(str::to_string),
                        at_rule: Some(prelude.to_string()),
                        selectors: Vec::new(),
                        body: String::new(),
                    });
                }
                prelude_start = pos + 1;
            }
            b'{' => {
                let prelude = css[prelude_start..pos].trim().to_string();
                let end = matching_brace(bytes, pos);
                let inner = &css[pos + 1..end];
                push_block(&prelude, inner, media, rules);
                pos = end;
                prelude_start = (end + 1).min(bytes.len());
            }
            _ => {}
        }
        pos += 1;
    }
}

fn push_block(prelude: &str, inner: &str, media: Option<&str>, rules: &mut Vec<CssRule>) {
    let nested = ["@media", "@supports"]
        .iter()
        .find_map(|kw| prelude.strip_prefix(kw).map(str::trim));

    if let Some(condition) = nested {
        let combined = match media {
            Some(outer) => format!("{} and {}", outer, condition),
            None => condition.to_string(),
        };
        walk(inner, Some(&combined), rules);
    } else if prelude.starts_with('@') {
        rules.push(CssRule {
            media: media.map(str::to_string),
            at_rule: Some(prelude.to_string()),
            selectors: Vec::new(),
            body: inner.trim().to_string(),
        });
    } else if !prelude.is_empty() {
        rules.push(CssRule {
            media: media.map(str::to_string),
            at_rule: None,
            selectors: prelude
                .split(',')
                .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|s| !s.is_empty())
                .collect(),
            body: inner.trim().to_string(),
        });
    }
}

/// Index of the `}` closing the `{` at `open`, or the end of input
fn matching_brace(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::embedded::THEME_CSS;

    fn rules_under<'a>(rules: &'a [CssRule], media: &str) -> Vec<&'a CssRule> {
        rules
            .iter()
            .filter(|r| r.media.as_deref().is_some_and(|m| m.contains(media)))
            .collect()
    }

    #[test]
    fn test_embedded_theme_is_fully_scoped() {
        let violations = scope_violations(THEME_CSS, SCOPE_CLASS);
        assert!(violations.is_empty(), "unscoped selectors: {:?}", violations);
    }

    #[test]
    fn test_unscoped_selectors_are_reported() {
        let css = r#"
            .genspark-slide h1 { color: red; }
            body { margin: 0; }
            @media print { .genspark-slideshow { x: y; } h2 { x: y; } }
        "#;
        let violations = scope_violations(css, SCOPE_CLASS);
        assert_eq!(
            violations,
            vec!["body", ".genspark-slideshow (in @media print)", "h2 (in @media print)"]
        );
    }

    #[test]
    fn test_breakpoint_collapses_grids() {
        let rules = parse_rules(THEME_CSS);
        let mobile = rules_under(&rules, "max-width: 768px");
        for grid in ["grid-2", "grid-3", "grid-4"] {
            let selector = format!(".genspark-slide .{}", grid);
            let rule = mobile
                .iter()
                .find(|r| r.has_selector(&selector))
                .unwrap_or_else(|| panic!("no mobile rule for {}", grid));
            assert!(rule.body.contains("grid-template-columns: 1fr"));
        }
    }

    #[test]
    fn test_print_strips_decoration() {
        let rules = parse_rules(THEME_CSS);
        let print = rules_under(&rules, "print");
        let root = print.iter().find(|r| r.has_selector(SCOPE_CLASS)).unwrap();
        assert!(root.body.contains("box-shadow: none"));
        assert!(root.body.contains("background: none"));
        assert!(root.body.contains("color: #000000"));
    }

    #[test]
    fn test_alert_and_dark_variants_present() {
        let rules = parse_rules(THEME_CSS);
        for variant in ["alert-info", "alert-success", "alert-warning", "alert-error"] {
            let selector = format!(".genspark-slide .{}", variant);
            assert!(rules.iter().any(|r| r.media.is_none() && r.has_selector(&selector)));
        }
        assert!(!rules_under(&rules, "prefers-color-scheme: dark").is_empty());
        assert!(!rules_under(&rules, "prefers-contrast").is_empty());
    }

    #[test]
    fn test_at_rules_are_opaque() {
        let css = "@import url('x.css');\n@font-face { font-family: X; src: url(a.woff2); }\n@keyframes spin { to { transform: rotate(360deg); } }";
        let rules = parse_rules(css);
        assert_eq!(rules.len(), 3);
        assert!(rules.iter().all(|r| !r.is_style_rule()));
        assert!(scope_violations(css, SCOPE_CLASS).is_empty());
    }

    #[test]
    fn test_comments_and_quotes() {
        let css = "/* body { } */ .genspark-slide q::before { content: \"{\"; }";
        let rules = parse_rules(css);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selectors, vec![".genspark-slide q::before"]);
    }

    #[test]
    fn test_comment_markers_inside_strings() {
        let css = r#"
            .genspark-slide a::after { content: "/*"; }
            body { margin: 0; }
            .genspark-slide b::before { content: '*/ \' /*'; }
            h3 { color: red; }
            /* p { } */
        "#;
        assert_eq!(scope_violations(css, SCOPE_CLASS), vec!["body", "h3"]);
        let rules = parse_rules(css);
        assert_eq!(rules.len(), 4);
        assert!(rules[0].body.contains(r#"content: "/*""#));
    }
}
