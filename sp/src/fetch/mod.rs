//! Resource fetching for offline bundles
//!
//! Downloads CDN stylesheets, scripts and fonts through a [`Fetcher`],
//! consulting and filling the asset cache, with bounded concurrency.

pub mod client;
mod downloader;
mod error;
mod filter;
pub mod fonts;
mod resource;

pub use client::{FetchedBody, Fetcher, HttpFetcher, OfflineFetcher};
pub use downloader::{DownloadReport, Downloader};
pub use error::FetchError;
pub use filter::CdnFilter;
pub use resource::{Resource, classify};
