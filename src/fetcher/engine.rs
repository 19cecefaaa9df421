//! The fetch engine
//!
//! # Request Flow
//!
//! 1. Derive the peer (host) and the cache key from the URL
//! 2. Look the key up in the response cache; a hit is returned at once,
//!    without touching the throttle or the network
//! 3. Wait on the politeness throttle for the peer
//! 4. Send the GET with the request's headers, proxy and timeout
//! 5. Classify the response:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Connect/DNS/timeout/body error | NetworkError, no retry |
//! | HTTP 200-399 | Success, body stored in the cache |
//! | HTTP 400-499 | ClientError, no retry |
//! | HTTP 500-599 | ServerError, back to step 2 while retries remain |
//!
//! There is no backoff beyond the throttle: the wait in step 3 spaces
//! retries to the same peer.

use crate::cache::{open_cache, CacheLookup, ResponseCache};
use crate::config::{validate_fetcher_config, Config, FetcherConfig};
use crate::fetcher::client::ClientPool;
use crate::fetcher::request::{FetchOutcome, FetchRequest, FetchResult};
use crate::throttle::PolitenessThrottle;
use crate::url::{cache_key, parse_url, peer_key};
use crate::{ConfigError, CourierError, UrlError};
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Outcome of a single network attempt
enum Attempt {
    /// A 2xx/3xx response with its body
    Page { status: u16, body: String },

    /// A response with an error status; the body is not read
    Rejected { status: u16 },

    /// No usable response
    Failed(reqwest::Error),
}

/// Rate-limited, cache-aware, retrying page fetcher
///
/// One `Fetcher` owns one throttle. Share it (behind an `Arc`) between all
/// workers that must respect the same politeness delays.
pub struct Fetcher {
    config: FetcherConfig,
    throttle: PolitenessThrottle,
    cache: Arc<dyn ResponseCache>,
    cache_ttl: Duration,
    clients: ClientPool,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch engine configuration (delay, timeout, proxies, UA)
    /// * `cache` - Response cache consulted before every network access
    /// * `cache_ttl` - Time-to-live given to newly stored responses
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to fetch
    /// * `Err(CourierError)` - Invalid configuration or HTTP client failure
    pub fn new(
        config: FetcherConfig,
        cache: Arc<dyn ResponseCache>,
        cache_ttl: Duration,
    ) -> Result<Self, CourierError> {
        validate_fetcher_config(&config)?;
        let clients = ClientPool::with_proxies(&config.proxies)?;
        let throttle = PolitenessThrottle::new(config.delay());

        Ok(Self {
            config,
            throttle,
            cache,
            cache_ttl,
            clients,
        })
    }

    /// Creates a fetcher and its cache from a full configuration
    pub fn from_config(config: &Config) -> Result<Self, CourierError> {
        let cache = open_cache(&config.cache)?;
        Self::new(config.fetcher.clone(), cache, config.cache.ttl())
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// The politeness throttle shared by every fetch through this instance
    pub fn throttle(&self) -> &PolitenessThrottle {
        &self.throttle
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    /// Builds the default request for `url`
    ///
    /// Sends the configured User-Agent, uses the configured timeout, and
    /// routes through a proxy picked at random from the pool (if any).
    pub fn request_for(&self, url: &str) -> FetchRequest {
        let proxy = self.config.proxies.choose(&mut rand::rng()).cloned();
        FetchRequest::new(url, self.config.timeout())
            .header(USER_AGENT.as_str(), self.config.user_agent.as_str())
            .proxy(proxy)
    }

    /// Fetches `url` with the default request settings
    ///
    /// See [`Fetcher::request_for`] and [`Fetcher::fetch`].
    pub async fn get(&self, url: &str, max_retries: u32) -> Result<FetchResult, CourierError> {
        let request = self.request_for(url);
        self.fetch(&request, max_retries).await
    }

    /// Fetches a page, consulting the cache and the throttle
    ///
    /// HTTP-level failures are reported through the result's outcome, never
    /// as `Err`. A 5xx status is retried up to `max_retries` times, and the
    /// cache is checked again before each retry.
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResult)` - The page, or the classified failure
    /// * `Err(CourierError)` - Bad URL or headers, or the cache backend failed
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        max_retries: u32,
    ) -> Result<FetchResult, CourierError> {
        let url = parse_url(request.url())?;
        let peer = peer_key(&url).ok_or_else(|| UrlError::MissingHost(url.to_string()))?;
        let key = cache_key(&url);
        let headers = build_headers(request)?;
        let client = self.clients.get(request.proxy_config())?;

        let mut retries_left = max_retries;
        let mut attempts = 0;

        loop {
            if let CacheLookup::Hit(entry) = self.cache.lookup(&key)? {
                tracing::info!("Returning from cache: {}", url);
                return Ok(FetchResult::cached(entry.status_code, entry.body, attempts));
            }

            self.throttle.wait(&peer).await;
            tracing::info!("Downloading: {}", url);
            attempts += 1;

            match send(&client, &url, headers.clone(), request.timeout()).await {
                Attempt::Page { status, body } => {
                    self.cache.store(&key, status, &body, self.cache_ttl)?;
                    return Ok(FetchResult::success(status, body, attempts));
                }
                Attempt::Failed(e) => {
                    log_network_error(&url, &e);
                    return Ok(FetchResult::network_error(attempts));
                }
                Attempt::Rejected { status }
                    if FetchOutcome::from_status(status) == FetchOutcome::ServerError
                        && retries_left > 0 =>
                {
                    retries_left -= 1;
                    tracing::warn!(
                        "Download error: HTTP {} for {}, retrying ({} retries left)",
                        status,
                        url,
                        retries_left
                    );
                }
                Attempt::Rejected { status } => {
                    tracing::warn!("Download error: HTTP {} for {}", status, url);
                    return Ok(FetchResult::http_error(status, attempts));
                }
            }
        }
    }
}

/// Sends one GET and reads the body of 2xx/3xx responses
async fn send(client: &Client, url: &Url, headers: HeaderMap, timeout: Duration) -> Attempt {
    let response = match client
        .get(url.clone())
        .headers(headers)
        .timeout(timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return Attempt::Failed(e),
    };

    let status = response.status().as_u16();
    if !FetchOutcome::from_status(status).is_success() {
        return Attempt::Rejected { status };
    }

    match response.text().await {
        Ok(body) => Attempt::Page { status, body },
        Err(e) => Attempt::Failed(e),
    }
}

/// Converts the request's header map into a reqwest `HeaderMap`
fn build_headers(request: &FetchRequest) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ConfigError::Validation(format!("Invalid header name '{}': {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Logs a network-level failure with its broad cause
fn log_network_error(url: &Url, error: &reqwest::Error) {
    let cause = if error.is_timeout() {
        "request timeout"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_body() || error.is_decode() {
        "broken response body"
    } else {
        "request failed"
    };
    tracing::warn!("Download error: {} for {}: {}", cause, url, error);
}
