//! Courier: a polite, cache-aware page fetcher fed by a shared work queue
//!
//! This crate fetches remote pages on behalf of a crawl process. It enforces a
//! per-host politeness delay, reuses previously fetched responses, retries
//! transient server failures, and drains URLs from a persistent queue that
//! several workers (or processes) can share.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod output;
pub mod queue;
pub mod storage;
pub mod throttle;
pub mod url;

use thiserror::Error;

/// Main error type for Courier operations
///
/// Ordinary HTTP failures are not errors; they are reported through
/// [`fetcher::FetchOutcome`]. Only conditions the caller cannot work around
/// (bad configuration, unreachable backends) surface here.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid proxy endpoint {endpoint}: {source}")]
    Proxy {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

// Re-export commonly used types
pub use cache::{CacheLookup, ResponseCache};
pub use config::Config;
pub use crawler::{CrawlLoop, CrawlStats, ResultHandler};
pub use fetcher::{FetchOutcome, FetchRequest, FetchResult, Fetcher};
pub use queue::WorkQueue;
pub use throttle::PolitenessThrottle;
