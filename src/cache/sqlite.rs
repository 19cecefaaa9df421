//! SQLite cache backend
//!
//! Entries live in the `response_cache` table, so every worker pointed at
//! the same database file sees the same cache.

use crate::cache::traits::{CacheEntry, CacheLookup, ResponseCache};
use crate::storage::{now_millis, open_connection, open_in_memory, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Response cache stored in a (possibly shared) SQLite database
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens the cache stored at `path`, creating the database if needed
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_connection(path)?),
        })
    }

    /// Creates a private in-memory cache (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_in_memory()?),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl ResponseCache for SqliteCache {
    fn lookup(&self, request_key: &str) -> StorageResult<CacheLookup> {
        let conn = self.conn()?;
        let row: Option<(u16, String, i64, i64)> = conn
            .query_row(
                "SELECT status_code, body, stored_at, expires_at FROM response_cache
                 WHERE request_key = ?1 AND expires_at > ?2",
                params![request_key, now_millis()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((status_code, body, stored_at, expires_at)) = row else {
            return Ok(CacheLookup::Miss);
        };

        let stored_at = DateTime::<Utc>::from_timestamp_millis(stored_at).ok_or_else(|| {
            StorageError::Corrupt {
                table: "response_cache",
                message: format!("stored_at {} out of range", stored_at),
            }
        })?;
        let ttl_millis = expires_at.saturating_sub(stored_at.timestamp_millis()).max(0);

        Ok(CacheLookup::Hit(CacheEntry {
            request_key: request_key.to_string(),
            status_code,
            body,
            stored_at,
            ttl: Duration::from_millis(ttl_millis as u64),
        }))
    }

    fn store(
        &self,
        request_key: &str,
        status_code: u16,
        body: &str,
        ttl: Duration,
    ) -> StorageResult<()> {
        let stored_at = now_millis();
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = stored_at.saturating_add(ttl_millis);

        self.conn()?.execute(
            "INSERT OR REPLACE INTO response_cache
             (request_key, status_code, body, stored_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![request_key, status_code, body, stored_at, expires_at],
        )?;
        Ok(())
    }

    fn purge_expired(&self) -> StorageResult<u64> {
        let removed = self.conn()?.execute(
            "DELETE FROM response_cache WHERE expires_at <= ?1",
            params![now_millis()],
        )?;
        Ok(removed as u64)
    }

    fn len(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM response_cache", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
