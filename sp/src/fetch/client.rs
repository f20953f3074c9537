//! Fetcher trait definition and HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::FetchError;
use crate::config::FetchConfig;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 2;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Raw response of a successful fetch
#[derive(Debug, Clone, Default)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    /// Lowercased `content-type` header, empty when absent
    pub content_type: String,
}

impl FetchedBody {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into().to_lowercase(),
        }
    }
}

/// Source of remote bytes
///
/// Each call is independent; caching and filtering live in the downloader.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a URL, failing on non-success status codes
    async fn get(&self, url: &str) -> Result<FetchedBody, FetchError>;
}

/// reqwest-backed fetcher with timeout, user agent and retry on transient errors
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Create a new fetcher from configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        debug!(?config, "HttpFetcher::from_config: called");
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }

    async fn get_once(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "HttpFetcher::get_once: HTTP error status");
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let bytes = response.bytes().await?;

        debug!(%url, %content_type, len = bytes.len(), "HttpFetcher::get_once: body read");
        Ok(FetchedBody::new(bytes.to_vec(), content_type))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedBody, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(%url, error = %e, ?backoff, "Transient fetch failure, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Fetcher for offline runs: every request is a miss
#[derive(Debug, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn get(&self, url: &str) -> Result<FetchedBody, FetchError> {
        debug!(%url, "OfflineFetcher::get: refusing network access");
        Err(FetchError::Offline(url.to_string()))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock fetcher for unit tests: serves a fixed URL map, 404 otherwise
    #[derive(Default)]
    pub struct MockFetcher {
        bodies: HashMap<String, FetchedBody>,
        call_count: AtomicUsize,
        calls: Mutex<Vec<String>>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: &str, content_type: &str) -> Self {
            self.bodies
                .insert(url.to_string(), FetchedBody::new(body.as_bytes().to_vec(), content_type));
            self
        }

        pub fn with_bytes(mut self, url: &str, bytes: &[u8], content_type: &str) -> Self {
            self.bodies
                .insert(url.to_string(), FetchedBody::new(bytes.to_vec(), content_type));
            self
        }

        /// Hold every request open for `delay` before answering
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Most requests that were in flight at the same time
        pub fn peak_concurrency(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn get(&self, url: &str) -> Result<FetchedBody, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(url.to_string());
            }

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.bodies.get(url).cloned().ok_or_else(|| FetchError::Http {
                status: 404,
                url: url.to_string(),
            })
        }
    }
}
