//! Slide tokens and the values substituted for them

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TemplateError;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("token regex is valid"));

/// Named insertion point of the slide template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlideToken {
    /// Plain text or minimal markup, used in both `<title>` and the heading
    Title,
    Subtitle,
    /// Arbitrary HTML fragment
    Content,
    Footer,
    /// Namespaces the chart canvas and the load log statement
    Id,
}

impl SlideToken {
    pub const ALL: [SlideToken; 5] = [
        SlideToken::Title,
        SlideToken::Subtitle,
        SlideToken::Content,
        SlideToken::Footer,
        SlideToken::Id,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "SLIDE_TITLE",
            Self::Subtitle => "SLIDE_SUBTITLE",
            Self::Content => "SLIDE_CONTENT",
            Self::Footer => "SLIDE_FOOTER",
            Self::Id => "SLIDE_ID",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for SlideToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Token occurrences found in a template
#[derive(Debug, Clone, Default)]
pub struct TokenScan {
    /// Occurrences of each known token (all five are always present as keys)
    pub counts: BTreeMap<SlideToken, usize>,
    /// Names inside `{{...}}` that are not slide tokens, in order of appearance
    pub unknown: Vec<String>,
}

impl TokenScan {
    pub fn count(&self, token: SlideToken) -> usize {
        self.counts.get(&token).copied().unwrap_or(0)
    }

    pub fn missing(&self) -> Vec<SlideToken> {
        SlideToken::ALL.into_iter().filter(|t| self.count(*t) == 0).collect()
    }
}

/// Count every `{{NAME}}` occurrence in a template
pub fn scan_tokens(template: &str) -> TokenScan {
    let mut scan = TokenScan {
        counts: SlideToken::ALL.into_iter().map(|t| (t, 0)).collect(),
        unknown: Vec::new(),
    };

    for cap in TOKEN_RE.captures_iter(template) {
        let name = &cap[1];
        match SlideToken::from_name(name) {
            Some(token) => *scan.counts.entry(token).or_insert(0) += 1,
            None => {
                if !scan.unknown.iter().any(|u| u == name) {
                    scan.unknown.push(name.to_string());
                }
            }
        }
    }

    debug!(?scan.counts, unknown = scan.unknown.len(), "scan_tokens: done");
    scan
}

/// Verify a template exposes every slide token and nothing else
pub fn check_template(template: &str) -> Result<TokenScan, TemplateError> {
    let scan = scan_tokens(template);

    let missing = scan.missing();
    if !missing.is_empty() {
        return Err(TemplateError::MissingTokens(
            missing.iter().map(|t| t.name().to_string()).collect(),
        ));
    }
    if !scan.unknown.is_empty() {
        return Err(TemplateError::UnknownTokens(scan.unknown.clone()));
    }

    Ok(scan)
}

/// Slide ids end up inside an element id and a script string literal
pub fn is_valid_slide_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Values for one rendered slide
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideFields {
    #[serde(rename = "SLIDE_TITLE")]
    pub title: String,

    #[serde(rename = "SLIDE_SUBTITLE")]
    pub subtitle: String,

    #[serde(rename = "SLIDE_CONTENT")]
    pub content: String,

    #[serde(rename = "SLIDE_FOOTER")]
    pub footer: String,

    #[serde(rename = "SLIDE_ID")]
    pub id: String,
}

impl SlideFields {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if !is_valid_slide_id(&self.id) {
            return Err(TemplateError::InvalidSlideId(self.id.clone()));
        }
        Ok(())
    }

    pub fn get(&self, token: SlideToken) -> &str {
        match token {
            SlideToken::Title => &self.title,
            SlideToken::Subtitle => &self.subtitle,
            SlideToken::Content => &self.content,
            SlideToken::Footer => &self.footer,
            SlideToken::Id => &self.id,
        }
    }
}
