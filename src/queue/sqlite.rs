//! SQLite queue backend
//!
//! Items live in the `queue_items` table. Every push and pop runs in an
//! IMMEDIATE transaction, which takes the database write lock up front, so
//! workers in different processes never pop the same row.

use crate::queue::traits::WorkQueue;
use crate::storage::{now_millis, open_connection, open_in_memory, StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Named work queue stored in a (possibly shared) SQLite database
pub struct SqliteQueue {
    conn: Mutex<Connection>,
    name: String,
}

impl SqliteQueue {
    /// Opens the queue `name` stored at `path`, creating the database if needed
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `name` - Queue name; different names in one file are independent
    pub fn open(path: &Path, name: &str) -> StorageResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_connection(path)?),
            name: name.to_string(),
        })
    }

    /// Creates a private in-memory queue (for testing)
    pub fn open_in_memory(name: &str) -> StorageResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_in_memory()?),
            name: name.to_string(),
        })
    }

    /// The queue name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl WorkQueue for SqliteQueue {
    fn push(&self, urls: &[String]) -> StorageResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now_millis();

        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO queue_items (queue, url, enqueued_at) VALUES (?1, ?2, ?3)",
            )?;
            for url in urls.iter().map(|url| url.trim()).filter(|url| !url.is_empty()) {
                stmt.execute(params![self.name, url, now])?;
                added += 1;
            }
        }

        tx.commit()?;
        tracing::debug!("Pushed {} URLs onto queue '{}'", added, self.name);
        Ok(added)
    }

    fn pop(&self) -> StorageResult<Option<String>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let item: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, url FROM queue_items WHERE queue = ?1 ORDER BY id ASC LIMIT 1",
                params![self.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((id, _)) = &item {
            tx.execute("DELETE FROM queue_items WHERE id = ?1", params![id])?;
        }

        tx.commit()?;
        Ok(item.map(|(_, url)| url))
    }

    fn len(&self) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM queue_items WHERE queue = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn clear(&self) -> StorageResult<u64> {
        let removed = self.conn()?.execute(
            "DELETE FROM queue_items WHERE queue = ?1",
            params![self.name],
        )?;
        Ok(removed as u64)
    }
}
