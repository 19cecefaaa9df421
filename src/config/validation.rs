use crate::config::types::{CacheConfig, Config, FetcherConfig, ProxyConfig, QueueConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the 5xx retry count
const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound on the politeness delay (one day)
const MAX_DELAY_SECS: f64 = 86_400.0;

/// Upper bound on the request timeout (one hour)
const MAX_TIMEOUT_SECS: f64 = 3_600.0;

/// Upper bound on how long a pop may wait for an item (one day)
const MAX_POP_WAIT_SECS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_cache_config(&config.cache)?;
    validate_queue_config(&config.queue)?;
    Ok(())
}

/// Validates fetch engine configuration
pub(crate) fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if !(0.0..=MAX_DELAY_SECS).contains(&config.delay_secs) {
        return Err(ConfigError::Validation(format!(
            "delay-secs must be between 0 and {}, got {}",
            MAX_DELAY_SECS, config.delay_secs
        )));
    }

    if !(config.timeout_secs > 0.0 && config.timeout_secs <= MAX_TIMEOUT_SECS) {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be greater than 0 and at most {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-retries must be at most {}, got {}",
            MAX_RETRIES_LIMIT, config.max_retries
        )));
    }

    for proxy in &config.proxies {
        validate_proxy(proxy)?;
    }

    Ok(())
}

/// Validates a single proxy map
fn validate_proxy(proxy: &ProxyConfig) -> Result<(), ConfigError> {
    if proxy.http.is_none() && proxy.https.is_none() {
        return Err(ConfigError::Validation(
            "proxy entry must set http, https, or both".to_string(),
        ));
    }

    for endpoint in [&proxy.http, &proxy.https].into_iter().flatten() {
        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy endpoint '{}': {}", endpoint, e))
        })?;
    }

    Ok(())
}

/// Validates response cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.enabled && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "cache database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates work queue configuration
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "queue database-path cannot be empty".to_string(),
        ));
    }

    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "queue name cannot be empty".to_string(),
        ));
    }

    if !(0.0..=MAX_POP_WAIT_SECS).contains(&config.pop_wait_secs) {
        return Err(ConfigError::Validation(format!(
            "pop-wait-secs must be between 0 and {}, got {}",
            MAX_POP_WAIT_SECS, config.pop_wait_secs
        )));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}
