//! Webfont embedding for Google Fonts and Font Awesome stylesheets

use std::sync::LazyLock;

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::{debug, warn};

use super::Resource;
use super::resource::url_path;

static FONT_FACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)@font-face\s*\{([^}]+)\}").expect("font-face regex is valid"));

static SRC_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"src:\s*url\(([^)]+)\)").expect("src url regex is valid"));

/// Absolute font file URLs referenced by `@font-face` `src` declarations
pub fn extract_font_urls(css: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for block in FONT_FACE_RE.captures_iter(css) {
        for src in SRC_URL_RE.captures_iter(&block[1]) {
            let url = src[1].trim().trim_matches(|c| c == '\'' || c == '"');
            if url.starts_with("http") && !url.contains("stats") && !urls.iter().any(|u| u == url) {
                urls.push(url.to_string());
            }
        }
    }
    debug!(count = urls.len(), "extract_font_urls: done");
    urls
}

/// CSS font format of a font file, from its extension
pub fn font_format(url: &str) -> &'static str {
    let path = url_path(url).to_lowercase();
    if path.ends_with(".woff2") {
        "woff2"
    } else if path.ends_with(".woff") {
        "woff"
    } else if path.ends_with(".ttf") {
        "truetype"
    } else if path.ends_with(".otf") {
        "opentype"
    } else {
        "woff2"
    }
}

/// `data:font/<format>;base64,...` for a downloaded font
pub fn font_data_uri(font: &Resource) -> String {
    font.data_uri(&format!("font/{}", font_format(&font.url)))
}

/// Replace absolute font URLs in a Google Fonts stylesheet with data URIs
pub fn embed_font_faces(css: &str, fonts: &[Resource]) -> String {
    fonts.iter().fold(css.to_string(), |css, font| css.replace(&font.url, &font_data_uri(font)))
}

/// Replace every `url(...)` reference to a known webfont with a data URI
///
/// Matches relative `webfonts/` and `fonts/` paths (with `../`, `./` or `/`
/// prefixes), a bare file name, or the font's absolute URL; quoted or not,
/// with an optional `?query` or `#hash` suffix.
pub fn embed_webfonts(css: &str, fonts: &[Resource]) -> String {
    let mut out = css.to_string();
    for font in fonts {
        let Some(file_name) = url_path(&font.url).rsplit('/').next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let pattern = format!(
            r#"url\(\s*['"]?(?:{abs}|(?:\.\./|\./|/)?(?:(?:web)?fonts/)?{name})(?:[?#][^'")\s]*)?['"]?\s*\)"#,
            abs = regex::escape(url_path(&font.url)),
            name = regex::escape(file_name),
        );
        let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                warn!(url = %font.url, error = %e, "Skipping webfont with unusable name");
                continue;
            }
        };
        let replacement = format!("url({})", font_data_uri(font));
        let count = re.find_iter(&out).count();
        out = re.replace_all(&out, NoExpand(&replacement)).into_owned();
        debug!(%file_name, count, "embed_webfonts: replaced references");
    }
    out
}
