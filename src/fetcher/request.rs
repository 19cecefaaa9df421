//! Fetch request and result types

use crate::config::ProxyConfig;
use std::collections::BTreeMap;
use std::time::Duration;

/// One GET to perform
///
/// A request is immutable once built; the fetcher only borrows it, so one
/// request value can be replayed across retries unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    url: String,
    headers: BTreeMap<String, String>,
    proxy: Option<ProxyConfig>,
    timeout: Duration,
}

impl FetchRequest {
    /// Creates a request for `url` with no headers and no proxy
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            proxy: None,
            timeout,
        }
    }

    /// Adds (or replaces) a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Routes the request through `proxy`
    pub fn proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn proxy_config(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Classification of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
    /// Status 200-399; the body is usable
    Success,

    /// Status 400-499 (or outside any known class); never retried
    ClientError,

    /// Status 500-599; retried up to the caller's bound
    ServerError,

    /// No response at all (connect, DNS, timeout, broken body)
    NetworkError,
}

impl FetchOutcome {
    /// Classifies an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => Self::Success,
            500..=599 => Self::ServerError,
            _ => Self::ClientError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Uniform result of a fetch
///
/// `body` is present exactly when `outcome` is `Success`. A missing body
/// means the caller must not use any content; an empty string is a valid
/// (empty) page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    body: Option<String>,
    status_code: Option<u16>,
    outcome: FetchOutcome,
    from_cache: bool,
    attempts: u32,
}

impl FetchResult {
    /// A response fetched over the network with a 2xx/3xx status
    pub(crate) fn success(status_code: u16, body: String, attempts: u32) -> Self {
        Self {
            body: Some(body),
            status_code: Some(status_code),
            outcome: FetchOutcome::Success,
            from_cache: false,
            attempts,
        }
    }

    /// A response replayed from the cache
    pub(crate) fn cached(status_code: u16, body: String, attempts: u32) -> Self {
        Self {
            from_cache: true,
            ..Self::success(status_code, body, attempts)
        }
    }

    /// A response whose status classifies as a client or server error
    pub(crate) fn http_error(status_code: u16, attempts: u32) -> Self {
        Self {
            body: None,
            status_code: Some(status_code),
            outcome: FetchOutcome::from_status(status_code),
            from_cache: false,
            attempts,
        }
    }

    /// No response was received
    pub(crate) fn network_error(attempts: u32) -> Self {
        Self {
            body: None,
            status_code: None,
            outcome: FetchOutcome::NetworkError,
            from_cache: false,
            attempts,
        }
    }

    /// The page body, present only on success
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Consumes the result, returning the body
    pub fn into_body(self) -> Option<String> {
        self.body
    }

    /// HTTP status of the final attempt; `None` when no response arrived
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn outcome(&self) -> FetchOutcome {
        self.outcome
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Whether the result was served from the response cache
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Number of network requests made to produce this result
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
