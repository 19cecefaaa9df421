use crate::storage::schema::initialize_schema;
use crate::storage::StorageResult;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// How long a statement waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens (or creates) a database file shared with other workers
///
/// The connection uses WAL journaling so readers never block the writer,
/// and a busy timeout so concurrent writers queue up instead of failing.
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(StorageError)` - Failed to open database
pub fn open_connection(path: &Path) -> StorageResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}

/// Opens a private in-memory database (not shared with anyone)
pub fn open_in_memory() -> StorageResult<Connection> {
    let conn = Connection::open_in_memory()?;
    initialize_schema(&conn)?;
    Ok(conn)
}
