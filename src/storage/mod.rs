//! Storage module for the shared durable store
//!
//! The work queue and the response cache both live in SQLite databases so
//! that several worker processes can share them. This module owns the schema,
//! the connection settings every handle uses, and the storage error type.

mod connection;
mod schema;

pub use connection::{open_connection, open_in_memory};
pub use schema::initialize_schema;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Current time as unix milliseconds, the timestamp format of every table
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
