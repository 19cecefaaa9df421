//! Work queue trait

use crate::storage::StorageResult;

/// Shared FIFO backlog of URLs waiting to be fetched
///
/// `push` and `pop` are each atomic: an item returned by one `pop` is never
/// returned by a concurrent `pop` on another handle to the same backlog.
/// There is no acknowledgement step, so an item whose worker dies after
/// popping it is gone.
pub trait WorkQueue: Send + Sync {
    /// Appends all given URLs, returning how many were added
    ///
    /// Blank entries are skipped.
    fn push(&self, urls: &[String]) -> StorageResult<usize>;

    /// Removes and returns the oldest URL, or `None` if the backlog is empty
    fn pop(&self) -> StorageResult<Option<String>>;

    /// Current backlog size
    fn len(&self) -> StorageResult<u64>;

    /// Whether the backlog is empty
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Drops every pending item, returning how many were removed
    fn clear(&self) -> StorageResult<u64>;
}
