//! Response cache trait and entry types

use crate::storage::StorageResult;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A previously observed successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Normalized request key (method + URL)
    pub request_key: String,

    /// HTTP status the response was received with
    pub status_code: u16,

    /// Response body
    pub body: String,

    /// When the entry was written
    pub stored_at: DateTime<Utc>,

    /// How long the entry stays valid after `stored_at`
    pub ttl: Duration,
}

impl CacheEntry {
    /// Point in time after which the entry is treated as a miss
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        self.stored_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether a read at `now` must ignore this entry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// An unexpired entry exists for the key
    Hit(CacheEntry),

    /// No entry, or only an expired one
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Keyed response store with per-entry time-to-live
///
/// Implementations must tolerate concurrent readers and writers; when two
/// writers store the same key the last one wins.
pub trait ResponseCache: Send + Sync {
    /// Looks up an unexpired entry for `request_key`
    fn lookup(&self, request_key: &str) -> StorageResult<CacheLookup>;

    /// Stores (or overwrites) the response for `request_key`
    fn store(&self, request_key: &str, status_code: u16, body: &str, ttl: Duration)
        -> StorageResult<()>;

    /// Deletes expired entries, returning how many were removed
    fn purge_expired(&self) -> StorageResult<u64>;

    /// Number of stored entries, expired ones included
    fn len(&self) -> StorageResult<u64>;

    /// Whether the cache holds no entries
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
