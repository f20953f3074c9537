//! Core AssetCache implementation

use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the JSON index inside the cache directory
pub const INDEX_FILE: &str = "cache_index.json";

/// Lock file guarding index writes across processes
const LOCK_FILE: &str = "cache_index.lock";

/// Kind of a cached asset, decided when it was downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Css,
    Js,
    Font,
    Other,
}

impl AssetKind {
    /// Stylesheets and scripts are inlined as text; everything else as bytes
    pub fn is_text(&self) -> bool {
        matches!(self, AssetKind::Css | AssetKind::Js)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
            AssetKind::Font => "font",
            AssetKind::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One record of the on-disk index
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    kind: AssetKind,
    cached_at: DateTime<Utc>,
    /// File name relative to the cache directory
    file: String,
    size: u64,
}

/// Public view of an index record
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub url: String,
    pub kind: AssetKind,
    pub cached_at: DateTime<Utc>,
    pub path: PathBuf,
    pub size: u64,
}

/// A cache hit with its content loaded
#[derive(Debug, Clone)]
pub struct CachedAsset {
    pub url: String,
    pub kind: AssetKind,
    pub bytes: Vec<u8>,
    pub path: PathBuf,
    pub cached_at: DateTime<Utc>,
}

/// Statistics for the whole cache
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of indexed entries
    pub entry_count: usize,
    /// Sum of recorded sizes
    pub total_bytes: u64,
    /// Entry count per kind
    pub by_kind: BTreeMap<AssetKind, usize>,
}

/// URL-keyed cache of downloaded assets
///
/// All methods take `&self`; the index is guarded internally so one cache can
/// be shared between concurrent download tasks behind an `Arc`.
pub struct AssetCache {
    /// Base path for storage
    base_path: PathBuf,
    index: Mutex<BTreeMap<String, IndexRecord>>,
}

impl AssetCache {
    /// Open or create a cache at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create cache directory")?;
        let index = load_index(&base_path.join(INDEX_FILE));
        debug!(?base_path, entries = index.len(), "Opened asset cache");
        Ok(Self {
            base_path,
            index: Mutex::new(index),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path an URL is (or would be) stored under
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.base_path.join(file_name_for(url))
    }

    /// True when the URL is indexed and its file is still on disk
    pub fn contains(&self, url: &str) -> bool {
        match self.lock_index() {
            Ok(index) => index
                .get(url)
                .map(|r| self.base_path.join(&r.file).exists())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Load a cached asset
    ///
    /// Unreadable files are treated as misses.
    pub fn get(&self, url: &str) -> Result<Option<CachedAsset>> {
        let record = match self.lock_index()?.get(url) {
            Some(r) => r.clone(),
            None => return Ok(None),
        };

        let path = self.base_path.join(&record.file);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(CachedAsset {
                url: url.to_string(),
                kind: record.kind,
                bytes,
                path,
                cached_at: record.cached_at,
            })),
            Err(e) => {
                warn!(%url, error = %e, "Cached file unreadable, treating as miss");
                Ok(None)
            }
        }
    }

    /// Store content for an URL and persist the index
    pub fn put(&self, url: &str, kind: AssetKind, bytes: &[u8]) -> Result<PathBuf> {
        let file = file_name_for(url);
        let path = self.base_path.join(&file);
        fs::write(&path, bytes).context(format!("Failed to write cache file: {}", path.display()))?;

        let mut index = self.lock_index()?;
        index.insert(
            url.to_string(),
            IndexRecord {
                kind,
                cached_at: Utc::now(),
                file,
                size: bytes.len() as u64,
            },
        );
        self.persist(&index)?;

        debug!(%url, %kind, size = bytes.len(), "Cached asset");
        Ok(path)
    }

    /// Remove a single entry; returns whether it existed
    pub fn remove(&self, url: &str) -> Result<bool> {
        let mut index = self.lock_index()?;
        let Some(record) = index.remove(url) else {
            return Ok(false);
        };

        let path = self.base_path.join(&record.file);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.persist(&index)?;
        info!(%url, "Removed cached asset");
        Ok(true)
    }

    /// Delete everything under the cache directory
    pub fn clear(&self) -> Result<usize> {
        let mut index = self.lock_index()?;
        let removed = index.len();

        if self.base_path.exists() {
            fs::remove_dir_all(&self.base_path).context("Failed to remove cache directory")?;
        }
        fs::create_dir_all(&self.base_path)?;
        index.clear();

        info!(removed, path = ?self.base_path, "Cleared asset cache");
        Ok(removed)
    }

    /// Remove entries cached longer ago than `older_than`
    pub fn prune(&self, older_than: Duration) -> Result<usize> {
        let age = chrono::Duration::from_std(older_than).context("Prune age out of range")?;
        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .ok_or_else(|| eyre!("Prune age out of range"))?;
        let mut index = self.lock_index()?;

        let stale: Vec<String> = index
            .iter()
            .filter(|(_, r)| r.cached_at < cutoff)
            .map(|(url, _)| url.clone())
            .collect();

        for url in &stale {
            if let Some(record) = index.remove(url) {
                let path = self.base_path.join(&record.file);
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }

        if !stale.is_empty() {
            self.persist(&index)?;
        }
        info!(pruned = stale.len(), "Pruned asset cache");
        Ok(stale.len())
    }

    /// All entries, sorted by URL
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let index = self.lock_index()?;
        Ok(index
            .iter()
            .map(|(url, r)| CacheEntry {
                url: url.clone(),
                kind: r.kind,
                cached_at: r.cached_at,
                path: self.base_path.join(&r.file),
                size: r.size,
            })
            .collect())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let index = self.lock_index()?;
        let mut stats = CacheStats::default();
        for record in index.values() {
            stats.entry_count += 1;
            stats.total_bytes += record.size;
            *stats.by_kind.entry(record.kind).or_insert(0) += 1;
        }
        Ok(stats)
    }

    fn lock_index(&self) -> Result<MutexGuard<'_, BTreeMap<String, IndexRecord>>> {
        self.index.lock().map_err(|_| eyre!("Cache index lock poisoned"))
    }

    /// Write the index atomically while holding the cross-process lock
    fn persist(&self, index: &BTreeMap<String, IndexRecord>) -> Result<()> {
        let lock = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.base_path.join(LOCK_FILE))
            .context("Failed to open cache lock file")?;
        FileExt::lock_exclusive(&lock).context("Failed to lock cache index")?;

        let index_path = self.base_path.join(INDEX_FILE);
        let tmp_path = self.base_path.join(format!("{}.tmp", INDEX_FILE));
        let content = serde_json::to_vec_pretty(index)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &index_path).context("Failed to replace cache index")?;

        FileExt::unlock(&lock)?;
        Ok(())
    }
}

/// Read the index; a missing or corrupt file yields an empty index
fn load_index(path: &Path) -> BTreeMap<String, IndexRecord> {
    if !path.exists() {
        return BTreeMap::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(index) => index,
            Err(e) => {
                warn!(?path, error = %e, "Corrupt cache index, starting empty");
                BTreeMap::new()
            }
        },
        Err(e) => {
            warn!(?path, error = %e, "Unreadable cache index, starting empty");
            BTreeMap::new()
        }
    }
}

/// `sha256(url)` in hex plus the extension of the URL path
pub fn file_name_for(url: &str) -> String {
    let hash = hex::encode(Sha256::digest(url.as_bytes()));
    format!("{}{}", hash, url_extension(url))
}

fn url_extension(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .split_once('/')
        .map(|(_, p)| p)
        .unwrap_or("")
        .split(['?', '#'])
        .next()
        .unwrap_or("");

    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{}", ext)
        }
        _ => ".cache".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CSS_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css";

    #[test]
    fn test_put_and_get() {
        let temp = TempDir::new().unwrap();
        let cache = AssetCache::open(temp.path()).unwrap();

        cache.put(CSS_URL, AssetKind::Css, b".fa{color:red}").unwrap();

        assert!(cache.contains(CSS_URL));
        let hit = cache.get(CSS_URL).unwrap().unwrap();
        assert_eq!(hit.kind, AssetKind::Css);
        assert_eq!(hit.bytes, b".fa{color:red}");
        assert!(hit.path.to_string_lossy().ends_with(".css"));
    }

    #[test]
    fn test_index_survives_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let cache = AssetCache::open(temp.path()).unwrap();
            cache.put(CSS_URL, AssetKind::Css, b"a{}").unwrap();
        }

        let cache = AssetCache::open(temp.path()).unwrap();
        assert!(cache.contains(CSS_URL));
        assert!(temp.path().join(INDEX_FILE).exists());
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = AssetCache::open(temp.path()).unwrap();
        let path = cache.put(CSS_URL, AssetKind::Css, b"a{}").unwrap();

        fs::remove_file(path).unwrap();

        assert!(!cache.contains(CSS_URL));
        assert!(cache.get(CSS_URL).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_index_starts_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(INDEX_FILE), "{ not json").unwrap();

        let cache = AssetCache::open(temp.path()).unwrap();
        assert_eq!(cache.stats().unwrap().entry_count, 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let cache = AssetCache::open(temp.path().join("cache")).unwrap();
        cache.put(CSS_URL, AssetKind::Css, b"a{}").unwrap();
        cache.put("https://unpkg.com/x/app.js", AssetKind::Js, b"1").unwrap();

        assert!(cache.remove(CSS_URL).unwrap());
        assert!(!cache.remove(CSS_URL).unwrap());
        assert_eq!(cache.entries().unwrap().len(), 1);

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.entries().unwrap().is_empty());
        assert!(cache.base_path().exists());
    }

    #[test]
    fn test_prune_keeps_fresh_entries() {
        let temp = TempDir::new().unwrap();
        let cache = AssetCache::open(temp.path()).unwrap();
        cache.put(CSS_URL, AssetKind::Css, b"a{}").unwrap();

        assert_eq!(cache.prune(Duration::from_secs(3600)).unwrap(), 0);
        assert!(cache.contains(CSS_URL));
    }

    #[test]
    fn test_prune_removes_stale_entries() {
        let temp = TempDir::new().unwrap();
        let js_url = "https://unpkg.com/x/app.js";
        let stale_file = {
            let cache = AssetCache::open(temp.path()).unwrap();
            cache.put(CSS_URL, AssetKind::Css, b"a{}").unwrap()
        };
        {
            let cache = AssetCache::open(temp.path()).unwrap();
            cache.put(js_url, AssetKind::Js, b"1").unwrap();
        }

        // Backdate the stylesheet entry
        let index_path = temp.path().join(INDEX_FILE);
        let mut index: serde_json::Value = serde_json::from_str(&fs::read_to_string(&index_path).unwrap()).unwrap();
        index[CSS_URL]["cached_at"] = serde_json::json!("2020-01-01T00:00:00Z");
        fs::write(&index_path, serde_json::to_string(&index).unwrap()).unwrap();

        let cache = AssetCache::open(temp.path()).unwrap();
        assert_eq!(cache.prune(Duration::from_secs(24 * 60 * 60)).unwrap(), 1);
        assert!(!cache.contains(CSS_URL));
        assert!(!stale_file.exists());
        assert!(cache.contains(js_url));

        let reopened = AssetCache::open(temp.path()).unwrap();
        assert_eq!(reopened.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_prune_age_out_of_range_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cache = AssetCache::open(temp.path()).unwrap();
        cache.put(CSS_URL, AssetKind::Css, b"a{}").unwrap();

        assert!(cache.prune(Duration::from_secs(u64::MAX)).is_err());
        assert!(cache.prune(Duration::from_secs(1_000_000_000 * 24 * 60 * 60)).is_err());
        assert!(cache.contains(CSS_URL));
    }

    #[test]
    fn test_stats_by_kind() {
        let temp = TempDir::new().unwrap();
        let cache = AssetCache::open(temp.path()).unwrap();
        cache.put(CSS_URL, AssetKind::Css, b"abc").unwrap();
        cache.put("https://unpkg.com/x/a.woff2", AssetKind::Font, b"12345").unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.total_bytes, 8);
        assert_eq!(stats.by_kind.get(&AssetKind::Font), Some(&1));
    }

    #[test]
    fn test_file_name_extension() {
        assert!(file_name_for("https://fonts.googleapis.com/css2?family=Inter").ends_with(".cache"));
        assert!(file_name_for("https://cdn.jsdelivr.net/npm/chart.js@4/dist/chart.umd.min.js?v=1").ends_with(".js"));
        assert!(file_name_for("https://example.com").ends_with(".cache"));
        assert_eq!(file_name_for(CSS_URL), file_name_for(CSS_URL));
        assert_ne!(file_name_for(CSS_URL), file_name_for("https://unpkg.com/a.css"));
    }
}
