//! Code snippet normalisation

use tracing::debug;

use crate::dom::{Ancestor, Element};

/// UI classes that mark a `<code>` as decoration rather than a code block
const EXCLUDED_CLASSES: &[&str] = &[
    "feature-highlight",
    "highlight-text",
    "highlight-box",
    "text-highlight",
    "badge",
    "label",
    "tag",
    "btn",
    "button",
    "card",
    "alert",
    "nav",
    "navbar",
    "breadcrumb",
    "pagination",
    "tab",
    "dropdown",
];

/// Bare class names accepted as a language hint
const KNOWN_LANGUAGES: &[&str] = &["python", "javascript", "html", "css", "sql", "bash", "json", "xml"];

/// Mark and normalise every code block under `root`, returning how many were found
///
/// A code block is a `<code>` inside `<pre>` or `.code-block`, or one with a
/// `language-*` class.
pub fn process_code_snippets(root: &mut Element) -> usize {
    let mut count = 0;
    root.visit_mut(&mut |el, ancestors| {
        if is_code_block(el, ancestors) && !is_excluded(el, ancestors) {
            format_block(el);
            count += 1;
        }
    });
    debug!(count, "process_code_snippets: done");
    count
}

fn is_code_block(el: &Element, ancestors: &[Ancestor]) -> bool {
    el.name == "code"
        && (el.attr("class").is_some_and(|c| c.contains("language-"))
            || ancestors.iter().any(|a| a.name == "pre" || a.has_class("code-block")))
}

/// The element, its parent or grandparent carries a UI class
fn is_excluded(el: &Element, ancestors: &[Ancestor]) -> bool {
    let own = el.classes();
    let near = ancestors.iter().rev().take(2).flat_map(|a| a.classes.iter());
    own.iter().chain(near).any(|c| EXCLUDED_CLASSES.contains(&c.as_str()))
}

fn format_block(el: &mut Element) {
    el.add_class("hljs");
    el.add_class("formatted-code");

    if el.attr("data-language").is_none()
        && let Some(language) = language_hint(&el.classes())
    {
        el.set_attr("data-language", language);
    }

    if let Some(text) = el.sole_text() {
        let normalised = dedent(text);
        el.set_text(normalised);
    }
}

fn language_hint(classes: &[String]) -> Option<String> {
    classes.iter().find_map(|c| match c.strip_prefix("language-") {
        Some(lang) => Some(lang.to_string()),
        None if KNOWN_LANGUAGES.contains(&c.as_str()) => Some(c.clone()),
        None => None,
    })
}

/// Trim surrounding blank lines and remove the indentation shared by all non-blank lines
///
/// Blank lines become empty; trailing whitespace at the end is dropped.
pub fn dedent(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let is_blank = |l: &&str| l.trim().is_empty();

    let Some(start) = lines.iter().position(|l| !is_blank(l)) else {
        return String::new();
    };
    let end = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(start);
    let body = &lines[start..=end];

    let indent = body
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|l| if is_blank(l) { String::new() } else { l.chars().skip(indent).collect() })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use proptest::prelude::*;

    fn body_html(root: &Element) -> String {
        root.find(&|e| e.name == "body").unwrap().inner_html()
    }

    #[test]
    fn test_dedent() {
        let code = "\n\n    fn main() {\n        run();\n    \n    }\n  \n";
        assert_eq!(dedent(code), "fn main() {\n    run();\n\n}");
    }

    #[test]
    fn test_dedent_blank() {
        assert_eq!(dedent("  \n\t\n"), "");
    }

    #[test]
    fn test_code_block_is_marked_and_dedented() {
        let mut root = parse_document(
            "<body><pre><code class=\"language-python\">\n    def f():\n        return 1\n</code></pre></body>",
        );
        assert_eq!(process_code_snippets(&mut root), 1);
        assert_eq!(
            body_html(&root),
            "<pre><code class=\"language-python hljs formatted-code\" data-language=\"python\">def f():\n    return 1</code></pre>"
        );
    }

    #[test]
    fn test_bare_language_class_and_existing_attribute() {
        let mut root = parse_document(
            "<body><div class=\"code-block\"><code class=\"sql\">select 1</code></div>\
             <pre><code class=\"bash\" data-language=\"sh\">ls</code></pre></body>",
        );
        assert_eq!(process_code_snippets(&mut root), 2);
        let html = body_html(&root);
        assert!(html.contains("<code class=\"sql hljs formatted-code\" data-language=\"sql\">"));
        assert!(html.contains("data-language=\"sh\""));
    }

    #[test]
    fn test_inline_and_ui_code_is_left_alone() {
        let source = "<body><p>Use <code>x</code></p>\
                      <div class=\"card\"><pre><code>y</code></pre></div>\
                      <pre class=\"badge\"><code>z</code></pre></body>";
        let mut root = parse_document(source);
        assert_eq!(process_code_snippets(&mut root), 0);
        assert!(!body_html(&root).contains("hljs"));
    }

    #[test]
    fn test_nested_markup_is_not_dedented() {
        let mut root = parse_document("<body><pre><code>  <span>a</span>\n  b</code></pre></body>");
        process_code_snippets(&mut root);
        assert!(body_html(&root).contains(">  <span>a</span>\n  b</code>"));
    }

    proptest! {
        #[test]
        fn prop_dedent_strips_common_indent(lines in proptest::collection::vec("[ \t]{0,4}[a-z ]{0,8}", 0..12)) {
            let code = lines.join("\n");
            let out = dedent(&code);

            // idempotent
            prop_assert_eq!(dedent(&out), out.clone());

            // some non-blank line starts at column zero
            let non_blank: Vec<&str> = out.lines().filter(|l| !l.trim().is_empty()).collect();
            if !non_blank.is_empty() {
                prop_assert!(non_blank.iter().any(|l| !l.starts_with(char::is_whitespace)));
            }

            // content of non-blank lines is kept, in order
            let before: Vec<&str> = code.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            let after: Vec<&str> = out.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            prop_assert_eq!(before, after);
        }
    }
}
