//! In-process cache backends

use crate::cache::traits::{CacheEntry, CacheLookup, ResponseCache};
use crate::storage::{StorageError, StorageResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Cache held in process memory, lost on restart
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> StorageResult<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl ResponseCache for MemoryCache {
    fn lookup(&self, request_key: &str) -> StorageResult<CacheLookup> {
        let entries = self.entries()?;
        Ok(match entries.get(request_key) {
            Some(entry) if !entry.is_expired_at(Utc::now()) => CacheLookup::Hit(entry.clone()),
            _ => CacheLookup::Miss,
        })
    }

    fn store(
        &self,
        request_key: &str,
        status_code: u16,
        body: &str,
        ttl: Duration,
    ) -> StorageResult<()> {
        let entry = CacheEntry {
            request_key: request_key.to_string(),
            status_code,
            body: body.to_string(),
            stored_at: Utc::now(),
            ttl,
        };
        self.entries()?.insert(request_key.to_string(), entry);
        Ok(())
    }

    fn purge_expired(&self) -> StorageResult<u64> {
        let now = Utc::now();
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok((before - entries.len()) as u64)
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.entries()?.len() as u64)
    }
}

/// Cache used when caching is switched off: every lookup misses
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCache;

impl ResponseCache for DisabledCache {
    fn lookup(&self, _request_key: &str) -> StorageResult<CacheLookup> {
        Ok(CacheLookup::Miss)
    }

    fn store(
        &self,
        _request_key: &str,
        _status_code: u16,
        _body: &str,
        _ttl: Duration,
    ) -> StorageResult<()> {
        Ok(())
    }

    fn purge_expired(&self) -> StorageResult<u64> {
        Ok(0)
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(0)
    }
}
