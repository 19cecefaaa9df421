//! Work queue module
//!
//! The queue is the shared backlog crawl workers drain. The SQLite backend
//! is durable and safe to share between processes; the memory backend is
//! for single-process use and tests.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryQueue;
pub use sqlite::SqliteQueue;
pub use traits::WorkQueue;

use crate::config::QueueConfig;
use crate::storage::StorageResult;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How a crawl worker pops from the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopMode {
    /// Return `None` at once when the backlog is empty
    Immediate,

    /// Poll for up to `timeout` before returning `None`
    Wait { timeout: Duration, poll: Duration },
}

impl PopMode {
    /// Derives the pop mode from the queue configuration
    pub fn from_config(config: &QueueConfig) -> Self {
        let timeout = config.pop_wait();
        if timeout.is_zero() {
            Self::Immediate
        } else {
            Self::Wait {
                timeout,
                poll: config.poll_interval(),
            }
        }
    }
}

/// Opens the SQLite queue described by the configuration
pub fn open_queue(config: &QueueConfig) -> StorageResult<Arc<dyn WorkQueue>> {
    tracing::debug!(
        "Opening queue '{}' at {}",
        config.name,
        config.database_path
    );
    let queue = SqliteQueue::open(Path::new(&config.database_path), &config.name)?;
    Ok(Arc::new(queue))
}

/// Pops one item, waiting according to `mode` when the backlog is empty
pub async fn pop_with(queue: &dyn WorkQueue, mode: PopMode) -> StorageResult<Option<String>> {
    let (timeout, poll) = match mode {
        PopMode::Immediate => return queue.pop(),
        PopMode::Wait { timeout, poll } => (timeout, poll),
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(url) = queue.pop()? {
            return Ok(Some(url));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}
