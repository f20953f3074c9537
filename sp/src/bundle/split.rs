//! Splitting an exported file into slides

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::BundleError;
use crate::dom::Element;

static HTML_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[^>]*>").expect("html open regex is valid"));

static HTML_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</html\s*>").expect("html close regex is valid"));

/// Split concatenated HTML documents into one string per slide
///
/// Anything before the first `<html>` tag is discarded. Each slide keeps its
/// opening tag and gets a closing `</html>` when it has none.
pub fn split_slides(content: &str) -> Result<Vec<String>, BundleError> {
    let starts: Vec<usize> = HTML_OPEN_RE.find_iter(content).map(|m| m.start()).collect();
    if starts.is_empty() {
        return Err(BundleError::NoSlides);
    }

    let slides: Vec<String> = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(content.len());
            let mut slide = content[start..end].to_string();
            if !HTML_CLOSE_RE.is_match(&slide) {
                slide.push_str("</html>");
            }
            slide
        })
        .collect();

    debug!(count = slides.len(), "split_slides: done");
    Ok(slides)
}

/// First non-empty `<title>`, else `<h1>`, else `<h2>`
pub fn deck_title(first_slide: &Element) -> Option<String> {
    ["title", "h1", "h2"].iter().find_map(|tag| {
        first_slide
            .find(&|e| e.name == *tag && !e.text().trim().is_empty())
            .map(|e| e.text().split_whitespace().collect::<Vec<_>>().join(" "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    #[test]
    fn test_split_discards_preamble_and_closes() {
        let content = "<!-- export -->\n<!DOCTYPE html><HTML lang=\"ko\"><body>A</body></html>\n<html><body>B</body>";
        let slides = split_slides(content).unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0], "<HTML lang=\"ko\"><body>A</body></html>\n");
        assert_eq!(slides[1], "<html><body>B</body></html>");
    }

    #[test]
    fn test_split_without_html_tag() {
        assert!(matches!(split_slides("<p>nothing</p>"), Err(BundleError::NoSlides)));
    }

    #[test]
    fn test_deck_title_priority() {
        let with_title = parse_document("<html><head><title> Q3  Report </title></head><body><h1>X</h1></body></html>");
        assert_eq!(deck_title(&with_title).as_deref(), Some("Q3 Report"));

        let with_h1 = parse_document("<html><head><title> </title></head><body><h2>B</h2><h1>A</h1></body></html>");
        assert_eq!(deck_title(&with_h1).as_deref(), Some("A"));

        let with_h2 = parse_document("<html><body><h2>B</h2></body></html>");
        assert_eq!(deck_title(&with_h2).as_deref(), Some("B"));

        assert_eq!(deck_title(&parse_document("<p>x</p>")), None);
    }
}
