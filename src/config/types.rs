use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Courier
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Fetch engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header sent by the convenience `get` call
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum interval between two network accesses to the same peer (seconds)
    #[serde(rename = "delay-secs", default = "default_delay_secs")]
    pub delay_secs: f64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Number of times a 5xx response is retried before it is surfaced
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Proxy pool; one entry is picked at random per convenience fetch
    #[serde(default)]
    pub proxies: Vec<ProxyConfig>,
}

impl FetcherConfig {
    /// Politeness delay as a `Duration`
    pub fn delay(&self) -> Duration {
        secs_to_duration(self.delay_secs)
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            delay_secs: default_delay_secs(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            proxies: Vec::new(),
        }
    }
}

/// Proxy endpoints keyed by the URL scheme they apply to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct ProxyConfig {
    /// Proxy used for `http://` URLs
    pub http: Option<String>,

    /// Proxy used for `https://` URLs
    pub https: Option<String>,
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// When false, every lookup misses and nothing is stored
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the SQLite database holding cached responses
    #[serde(rename = "database-path", default = "default_cache_path")]
    pub database_path: String,

    /// Time-to-live of a cached response (seconds)
    #[serde(rename = "ttl-secs", default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: default_cache_path(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Work queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Path to the SQLite database holding the backlog
    #[serde(rename = "database-path", default = "default_queue_path")]
    pub database_path: String,

    /// Queue name; several queues may live in one database
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// How long a pop waits for an item before giving up (0 = never wait)
    #[serde(rename = "pop-wait-secs", default)]
    pub pop_wait_secs: f64,

    /// Polling interval used while a pop is waiting (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl QueueConfig {
    pub fn pop_wait(&self) -> Duration {
        secs_to_duration(self.pop_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            database_path: default_queue_path(),
            name: default_queue_name(),
            pop_wait_secs: 0.0,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Output configuration for the page archive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Directory where fetched pages are written, if any
    pub directory: Option<String>,
}

/// Converts a seconds value to a `Duration`, clamping negatives and NaN to
/// zero and saturating values too large to represent
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

fn default_user_agent() -> String {
    format!("courier/{}", env!("CARGO_PKG_VERSION"))
}

fn default_delay_secs() -> f64 {
    5.0
}

fn default_timeout_secs() -> f64 {
    60.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_cache_path() -> String {
    "./courier-cache.db".to_string()
}

fn default_ttl_secs() -> u64 {
    3 * 24 * 60 * 60
}

fn default_queue_path() -> String {
    "./courier-queue.db".to_string()
}

fn default_queue_name() -> String {
    "crawl".to_string()
}

fn default_poll_interval_ms() -> u64 {
    200
}
