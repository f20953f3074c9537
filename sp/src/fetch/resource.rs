//! Downloaded resources

use std::borrow::Cow;

use assetcache::AssetKind;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A resource ready to be inlined
#[derive(Debug, Clone)]
pub struct Resource {
    pub url: String,
    pub kind: AssetKind,
    pub bytes: Vec<u8>,
    /// Served from the asset cache
    pub cached: bool,
}

impl Resource {
    /// Body as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn data_uri(&self, mime: &str) -> String {
        format!("data:{};base64,{}", mime, self.base64())
    }
}

/// Classify a resource from its content type, falling back to the URL extension
pub fn classify(content_type: &str, url: &str) -> AssetKind {
    let content_type = content_type.to_lowercase();
    let path = url_path(url).to_lowercase();

    if content_type.contains("css") || path.ends_with(".css") {
        AssetKind::Css
    } else if content_type.contains("javascript") || path.ends_with(".js") {
        AssetKind::Js
    } else if content_type.contains("font") || [".woff", ".woff2", ".ttf", ".otf"].iter().any(|e| path.ends_with(e)) {
        AssetKind::Font
    } else {
        AssetKind::Other
    }
}

/// URL without query and fragment
pub(crate) fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_content_type() {
        assert_eq!(classify("text/css; charset=utf-8", "https://x/a"), AssetKind::Css);
        assert_eq!(classify("application/javascript", "https://x/a"), AssetKind::Js);
        assert_eq!(classify("font/woff2", "https://x/a"), AssetKind::Font);
        assert_eq!(classify("image/png", "https://x/a.png"), AssetKind::Other);
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("", "https://unpkg.com/a/dist/style.css?v=2"), AssetKind::Css);
        assert_eq!(classify("text/plain", "https://unpkg.com/a/index.js"), AssetKind::Js);
        assert_eq!(classify("", "https://x/webfonts/fa-solid-900.woff2#iefix"), AssetKind::Font);
        assert_eq!(classify("application/octet-stream", "https://x/f.ttf"), AssetKind::Font);
    }

    #[test]
    fn test_data_uri() {
        let resource = Resource {
            url: "https://x/f.woff2".to_string(),
            kind: AssetKind::Font,
            bytes: b"abc".to_vec(),
            cached: false,
        };
        assert_eq!(resource.data_uri("font/woff2"), "data:font/woff2;base64,YWJj");
        assert_eq!(resource.text(), "abc");
    }
}
