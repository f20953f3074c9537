//! CDN URL filter

use eyre::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::config::CdnConfig;

/// Decides which URLs are downloaded and inlined
#[derive(Debug, Clone)]
pub struct CdnFilter {
    allow: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl CdnFilter {
    /// Compile the configured patterns
    pub fn new(config: &CdnConfig) -> Result<Self> {
        debug!(allow = config.allow.len(), exclude = config.exclude.len(), "CdnFilter::new: called");
        Ok(Self {
            allow: compile(&config.allow)?,
            exclude: compile(&config.exclude)?,
        })
    }

    /// Filter built from the default pattern lists
    pub fn from_defaults() -> Result<Self> {
        Self::new(&CdnConfig::default())
    }

    /// No exclude pattern matches at the start, and some allow pattern matches
    pub fn is_downloadable(&self, url: &str) -> bool {
        if self.exclude.iter().any(|re| re.find(url).is_some_and(|m| m.start() == 0)) {
            debug!(%url, "CdnFilter::is_downloadable: excluded");
            return false;
        }
        self.allow.iter().any(|re| re.is_match(url))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).context(format!("Invalid CDN pattern: {}", p)))
        .collect()
}
