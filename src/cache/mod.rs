//! Response cache module
//!
//! The fetcher consults the cache before every network access. A hit is
//! returned as [`CacheLookup::Hit`], which lets the fetcher skip both the
//! network call and the politeness throttle.

mod memory;
mod sqlite;
mod traits;

pub use memory::{DisabledCache, MemoryCache};
pub use sqlite::SqliteCache;
pub use traits::{CacheEntry, CacheLookup, ResponseCache};

use crate::config::CacheConfig;
use crate::storage::StorageResult;
use std::path::Path;
use std::sync::Arc;

/// Opens the cache described by the configuration
///
/// # Returns
///
/// * A [`SqliteCache`] when caching is enabled
/// * A [`DisabledCache`] otherwise
pub fn open_cache(config: &CacheConfig) -> StorageResult<Arc<dyn ResponseCache>> {
    if !config.enabled {
        tracing::info!("Response cache disabled");
        return Ok(Arc::new(DisabledCache));
    }

    tracing::debug!("Opening response cache at {}", config.database_path);
    let cache = SqliteCache::open(Path::new(&config.database_path))?;
    Ok(Arc::new(cache))
}
