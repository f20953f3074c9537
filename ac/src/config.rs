//! Configuration for assetcache

use eyre::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the cache directory
    #[serde(default = "default_cache_dir", rename = "cache-dir")]
    pub cache_dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(crate::DEFAULT_CACHE_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    ///
    /// An explicit path must load. Implicit files that fail to load are
    /// logged and skipped.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        let default_paths = [
            Some(PathBuf::from("assetcache.yml")),
            dirs::config_dir().map(|p| p.join("assetcache").join("config.yml")),
        ];
        Ok(Self::first_loadable(default_paths.iter().flatten()))
    }

    fn first_loadable<'a>(candidates: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to load config from {}: {:#}", path.display(), e),
            }
        }
        Config::default()
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
