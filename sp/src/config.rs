//! slidepack configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main slidepack configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Directory layout
    pub paths: PathsConfig,

    /// HTTP fetching
    pub fetch: FetchConfig,

    /// Which URLs may be downloaded
    pub cdn: CdnConfig,

    /// Resources every bundle embeds
    pub essentials: EssentialsConfig,

    /// Presentation document settings
    pub presentation: PresentationConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .slidepack.yml
        let local_config = PathBuf::from(".slidepack.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/slidepack/slidepack.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("slidepack").join("slidepack.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = [
            config_path.cloned(),
            Some(PathBuf::from(".slidepack.yml")),
            dirs::config_dir().map(|d| d.join("slidepack").join("slidepack.yml")),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Directory layout, relative to the working directory unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where exported slide files are looked up by name
    #[serde(rename = "source-dir")]
    pub source_dir: PathBuf,

    /// Where bundled presentations are written
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Asset cache directory
    #[serde(rename = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Template override directory
    #[serde(rename = "template-dir")]
    pub template_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("source"),
            output_dir: PathBuf::from("output"),
            cache_dir: PathBuf::from(assetcache::DEFAULT_CACHE_DIR),
            template_dir: PathBuf::from(".slidepack/templates"),
        }
    }
}

/// HTTP fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum downloads in flight
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Never touch the network; serve from cache only
    pub offline: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_concurrent: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            offline: false,
        }
    }
}

/// URL patterns deciding what is downloaded and inlined
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    /// A URL is downloadable when any of these match
    pub allow: Vec<String>,

    /// ...and none of these match at its start
    pub exclude: Vec<String>,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            allow: [
                r"https?://cdn\.jsdelivr\.net/[^/]+/",
                r"https?://cdnjs\.cloudflare\.com/[^/]+/",
                r"https?://unpkg\.com/[^/]+/",
                r"https?://fonts\.googleapis\.com/css",
                r"https?://fonts\.gstatic\.com/s/",
                r"https?://ajax\.googleapis\.com/[^/]+/",
                r"https?://code\.jquery\.com/[^/]+/",
                r"https?://stackpath\.bootstrapcdn\.com/[^/]+/",
                r"https?://maxcdn\.bootstrapcdn\.com/[^/]+/",
            ]
            .map(String::from)
            .to_vec(),
            exclude: [
                r"https?://fonts\.gstatic\.com/?$",
                r"https?://fonts\.googleapis\.com/?$",
                r"https?://fonts\.gstatic\.com/stats/",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Resources embedded into every presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EssentialsConfig {
    #[serde(rename = "highlight-js")]
    pub highlight_js: String,

    #[serde(rename = "highlight-css")]
    pub highlight_css: String,

    #[serde(rename = "fontawesome-css")]
    pub fontawesome_css: String,

    #[serde(rename = "fontawesome-webfonts")]
    pub fontawesome_webfonts: Vec<String>,
}

impl EssentialsConfig {
    /// Every essential URL, in a stable order
    pub fn urls(&self) -> Vec<String> {
        let mut urls = vec![
            self.highlight_js.clone(),
            self.highlight_css.clone(),
            self.fontawesome_css.clone(),
        ];
        urls.extend(self.fontawesome_webfonts.iter().cloned());
        urls.retain(|u| !u.is_empty());
        urls
    }
}

impl Default for EssentialsConfig {
    fn default() -> Self {
        let hljs = "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0";
        let fa = "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0";
        Self {
            highlight_js: format!("{}/highlight.min.js", hljs),
            highlight_css: format!("{}/styles/github.min.css", hljs),
            fontawesome_css: format!("{}/css/all.min.css", fa),
            fontawesome_webfonts: ["fa-solid-900.woff2", "fa-regular-400.woff2", "fa-brands-400.woff2"]
                .iter()
                .map(|f| format!("{}/webfonts/{}", fa, f))
                .collect(),
        }
    }
}

/// Presentation document settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Title used when the first slide has none
    #[serde(rename = "default-title")]
    pub default_title: String,

    /// `lang` attribute of the document
    pub lang: String,

    /// Include the slide theme stylesheet
    #[serde(rename = "embed-theme")]
    pub embed_theme: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            default_title: "GenSpark AI Slides".to_string(),
            lang: "ko".to_string(),
            embed_theme: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch.max_concurrent, 5);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert_eq!(config.paths.output_dir, PathBuf::from("output"));
        assert_eq!(config.essentials.urls().len(), 6);
        assert!(config.presentation.embed_theme);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("slidepack.yml");
        fs::write(
            &path,
            "log-level: debug\nfetch:\n  max-concurrent: 2\n  offline: true\npresentation:\n  lang: en\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.fetch.max_concurrent, 2);
        assert!(config.fetch.offline);
        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.presentation.lang, "en");
        assert_eq!(config.presentation.default_title, "GenSpark AI Slides");
        assert_eq!(config.cdn.allow.len(), 9);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let path = PathBuf::from("/nonexistent/slidepack.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_log_level() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("slidepack.yml");
        fs::write(&path, "log-level: WARN\n").unwrap();
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("WARN"));
    }

    #[test]
    fn test_empty_essentials_are_skipped() {
        let essentials = EssentialsConfig {
            highlight_js: String::new(),
            fontawesome_webfonts: vec![],
            ..Default::default()
        };
        assert_eq!(essentials.urls().len(), 2);
    }
}
