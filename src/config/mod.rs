//! Configuration module for Courier
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use courier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("courier.toml")).unwrap();
//! println!("Politeness delay: {:?}", config.fetcher.delay());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, FetcherConfig, OutputConfig, ProxyConfig, QueueConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub(crate) use validation::validate_fetcher_config;
