//! Downloader - cache-aware, bounded-concurrency resource fetching

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use assetcache::{AssetCache, AssetKind};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::fonts::{embed_font_faces, extract_font_urls};
use super::{CdnFilter, FetchError, Fetcher, Resource, classify};

/// Outcome of downloading a set of URLs
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Every resource that could be loaded, keyed by URL
    pub resources: HashMap<String, Resource>,
    /// Served from the cache
    pub cached: usize,
    /// Fetched over the network
    pub downloaded: usize,
    /// URL and reason for every failure
    pub failed: Vec<(String, String)>,
}

impl DownloadReport {
    pub fn get(&self, url: &str) -> Option<&Resource> {
        self.resources.get(url)
    }
}

/// Fetches CDN resources through a [`Fetcher`], reading and filling the asset cache
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<AssetCache>,
    filter: Arc<CdnFilter>,
    semaphore: Arc<Semaphore>,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<AssetCache>, filter: CdnFilter, max_concurrent: usize) -> Self {
        debug!(max_concurrent, "Downloader::new: called");
        Self {
            fetcher,
            cache,
            filter: Arc::new(filter),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn filter(&self) -> &CdnFilter {
        &self.filter
    }

    /// Load one resource: filter, cache hit, or fetch and cache
    ///
    /// Google Fonts stylesheets have their font files downloaded and
    /// embedded before the stylesheet is cached.
    pub async fn fetch_one(&self, url: &str) -> Result<Resource, FetchError> {
        debug!(%url, "Downloader::fetch_one: called");
        if let Some(hit) = self.lookup(url)? {
            return Ok(hit);
        }

        let body = self.fetcher.get(url).await?;
        let (kind, bytes) = if is_google_fonts_css(url) {
            let css = String::from_utf8_lossy(&body.bytes).into_owned();
            (AssetKind::Css, self.embed_google_fonts(&css).await.into_bytes())
        } else {
            (classify(&body.content_type, url), body.bytes)
        };

        self.store(url, kind, &bytes);
        info!(%url, %kind, size = bytes.len(), "Downloaded");
        Ok(Resource {
            url: url.to_string(),
            kind,
            bytes,
            cached: false,
        })
    }

    /// Load many resources concurrently, at most `max_concurrent` in flight
    ///
    /// Duplicates are fetched once. Failures are collected, never fatal.
    pub async fn fetch_all<I, S>(&self, urls: I) -> DownloadReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls.into_iter().map(Into::into).filter(|u| seen.insert(u.clone())).collect();
        debug!(count = unique.len(), "Downloader::fetch_all: called");

        let mut handles = Vec::with_capacity(unique.len());
        for url in unique {
            let downloader = self.clone();
            let semaphore = self.semaphore.clone();
            handles.push(tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => downloader.fetch_one(&url).await,
                    Err(e) => Err(FetchError::Task(e.to_string())),
                };
                (url, result)
            }));
        }

        let mut report = DownloadReport::default();
        for joined in futures::future::join_all(handles).await {
            let (url, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Download task panicked");
                    report.failed.push(("<task>".to_string(), e.to_string()));
                    continue;
                }
            };
            match result {
                Ok(resource) => {
                    if resource.cached {
                        report.cached += 1;
                    } else {
                        report.downloaded += 1;
                    }
                    report.resources.insert(url, resource);
                }
                Err(e) => {
                    warn!(%url, error = %e, "Resource unavailable, keeping original reference");
                    report.failed.push((url, e.to_string()));
                }
            }
        }

        info!(
            cached = report.cached,
            downloaded = report.downloaded,
            failed = report.failed.len(),
            "Resources loaded"
        );
        report
    }

    /// Filter check and cache lookup
    fn lookup(&self, url: &str) -> Result<Option<Resource>, FetchError> {
        if !self.filter.is_downloadable(url) {
            return Err(FetchError::Excluded(url.to_string()));
        }
        let hit = self.cache.get(url).map_err(|e| FetchError::Cache(e.to_string()))?;
        Ok(hit.map(|asset| {
            debug!(%url, "Downloader::lookup: cache hit");
            Resource {
                url: asset.url,
                kind: asset.kind,
                bytes: asset.bytes,
                cached: true,
            }
        }))
    }

    /// Fetch a font file referenced by a Google Fonts stylesheet
    async fn fetch_font(&self, url: &str) -> Result<Resource, FetchError> {
        if let Some(hit) = self.lookup(url)? {
            return Ok(hit);
        }
        let body = self.fetcher.get(url).await?;
        self.store(url, AssetKind::Font, &body.bytes);
        Ok(Resource {
            url: url.to_string(),
            kind: AssetKind::Font,
            bytes: body.bytes,
            cached: false,
        })
    }

    async fn embed_google_fonts(&self, css: &str) -> String {
        let mut fonts = Vec::new();
        for font_url in extract_font_urls(css) {
            match self.fetch_font(&font_url).await {
                Ok(font) => fonts.push(font),
                Err(e) => warn!(url = %font_url, error = %e, "Google font unavailable"),
            }
        }
        debug!(count = fonts.len(), "Downloader::embed_google_fonts: embedding");
        embed_font_faces(css, &fonts)
    }

    fn store(&self, url: &str, kind: AssetKind, bytes: &[u8]) {
        if let Err(e) = self.cache.put(url, kind, bytes) {
            warn!(%url, error = %e, "Failed to cache resource");
        }
    }
}

fn is_google_fonts_css(url: &str) -> bool {
    url.contains("fonts.googleapis.com/css")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::OfflineFetcher;
    use crate::fetch::client::mock::MockFetcher;
    use tempfile::TempDir;

    const JS: &str = "https://cdn.jsdelivr.net/npm/chart.js";
    const CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/a/1.0/a.css";

    fn downloader(fetcher: Arc<dyn Fetcher>, temp: &TempDir) -> Downloader {
        let cache = Arc::new(AssetCache::open(temp.path().join("cache")).unwrap());
        Downloader::new(fetcher, cache, CdnFilter::from_defaults().unwrap(), 2)
    }

    #[tokio::test]
    async fn test_fetch_one_caches() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockFetcher::new().with(JS, "var Chart;", "application/javascript"));
        let dl = downloader(mock.clone(), &temp);

        let first = dl.fetch_one(JS).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.kind, AssetKind::Js);

        let second = dl.fetch_one(JS).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.text(), "var Chart;");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_excluded_url_is_not_fetched() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockFetcher::new());
        let dl = downloader(mock.clone(), &temp);

        let result = dl.fetch_one("https://example.com/app.js").await;
        assert!(matches!(result, Err(FetchError::Excluded(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_all_counts_and_dedups() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(
            MockFetcher::new()
                .with(JS, "var Chart;", "application/javascript")
                .with(CSS, "a{}", "text/css"),
        );
        let dl = downloader(mock.clone(), &temp);
        dl.fetch_one(CSS).await.unwrap();

        let missing = "https://unpkg.com/missing@1/x.js";
        let report = dl.fetch_all([JS, CSS, JS, missing]).await;

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.cached, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, missing);
        assert!(report.get(JS).is_some());
        assert_eq!(mock.calls().iter().filter(|u| *u == JS).count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_respects_max_concurrent() {
        let temp = TempDir::new().unwrap();
        let urls: Vec<String> = (0..6).map(|i| format!("https://unpkg.com/lib@1/part{i}.js")).collect();
        let mock = urls
            .iter()
            .fold(MockFetcher::new(), |m, url| m.with(url, "1", "application/javascript"))
            .with_delay(std::time::Duration::from_millis(50));
        let mock = Arc::new(mock);
        let dl = downloader(mock.clone(), &temp);

        let report = dl.fetch_all(urls.clone()).await;

        assert_eq!(report.downloaded, 6);
        assert_eq!(mock.call_count(), 6);
        assert_eq!(mock.peak_concurrency(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fetch_all_bound_holds_across_threads() {
        let temp = TempDir::new().unwrap();
        let urls: Vec<String> = (0..8).map(|i| format!("https://unpkg.com/lib@1/chunk{i}.js")).collect();
        let mock = urls
            .iter()
            .fold(MockFetcher::new(), |m, url| m.with(url, "1", "application/javascript"))
            .with_delay(std::time::Duration::from_millis(20));
        let mock = Arc::new(mock);
        let dl = downloader(mock.clone(), &temp);

        let report = dl.fetch_all(urls).await;

        assert_eq!(report.downloaded, 8);
        assert!(mock.peak_concurrency() <= 2);
    }

    #[tokio::test]
    async fn test_offline_serves_cache_only() {
        let temp = TempDir::new().unwrap();
        let online = downloader(Arc::new(MockFetcher::new().with(CSS, "a{}", "text/css")), &temp);
        online.fetch_one(CSS).await.unwrap();

        let offline = downloader(Arc::new(OfflineFetcher), &temp);
        let report = offline.fetch_all([CSS, JS]).await;
        assert_eq!(report.cached, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].1.contains("Offline"));
    }

    #[tokio::test]
    async fn test_google_fonts_are_embedded() {
        let temp = TempDir::new().unwrap();
        let css_url = "https://fonts.googleapis.com/css2?family=Noto+Sans+KR";
        let font_url = "https://fonts.gstatic.com/s/notosanskr/v36/a.woff2";
        let css = format!("@font-face {{ src: url({}) format('woff2'); }}", font_url);
        let mock = Arc::new(
            MockFetcher::new()
                .with(css_url, &css, "text/css")
                .with_bytes(font_url, b"abc", "font/woff2"),
        );
        let dl = downloader(mock, &temp);

        let resource = dl.fetch_one(css_url).await.unwrap();
        assert_eq!(resource.kind, AssetKind::Css);
        assert!(resource.text().contains("url(data:font/woff2;base64,YWJj)"));

        let cache = AssetCache::open(temp.path().join("cache")).unwrap();
        assert!(cache.contains(css_url));
        assert!(cache.contains(font_url));
    }
}
