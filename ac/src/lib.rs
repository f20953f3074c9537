//! AssetCache - persistent URL-keyed cache for web assets
//!
//! Keeps downloaded stylesheets, scripts and fonts on disk so repeated
//! bundling runs work offline and never fetch the same URL twice.
//!
//! # Layout
//!
//! ```text
//! cache/
//! ├── cache_index.json    # url -> kind, cached_at, file, size
//! ├── cache_index.lock    # guards index writes across processes
//! ├── 3f1c…9a.css
//! ├── 77b0…e2.woff2
//! └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use assetcache::{AssetCache, AssetKind};
//!
//! let cache = AssetCache::open("cache")?;
//! cache.put("https://unpkg.com/x/app.css", AssetKind::Css, b"a{}")?;
//! let hit = cache.get("https://unpkg.com/x/app.css")?;
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{AssetCache, AssetKind, CacheEntry, CacheStats, CachedAsset, INDEX_FILE, file_name_for};

/// Default cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = "cache";
