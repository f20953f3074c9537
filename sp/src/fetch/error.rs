//! Fetch error types

use thiserror::Error;

/// Errors that can occur while fetching a resource
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not a downloadable CDN URL: {0}")]
    Excluded(String),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Offline and not cached: {0}")]
    Offline(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// Check if retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            FetchError::Network(_) => true,
            FetchError::Excluded(_) => false,
            FetchError::Offline(_) => false,
            FetchError::Cache(_) => false,
            FetchError::Task(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        // 5xx errors should be retryable
        assert!(
            FetchError::Http {
                status: 503,
                url: "https://unpkg.com/x".to_string()
            }
            .is_retryable()
        );

        // Rate limiting and request timeout too
        assert!(
            FetchError::Http {
                status: 429,
                url: "https://unpkg.com/x".to_string()
            }
            .is_retryable()
        );

        // 404 should not be retryable
        assert!(
            !FetchError::Http {
                status: 404,
                url: "https://unpkg.com/x".to_string()
            }
            .is_retryable()
        );

        assert!(!FetchError::Offline("https://unpkg.com/x".to_string()).is_retryable());
        assert!(!FetchError::Excluded("https://example.com".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = FetchError::Http {
            status: 404,
            url: "https://unpkg.com/x".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://unpkg.com/x");
    }
}
