//! In-process queue backend

use crate::queue::traits::WorkQueue;
use crate::storage::{StorageError, StorageResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Backlog held in process memory; shared only by handles to one instance
#[derive(Debug, Default)]
pub struct MemoryQueue {
    items: Mutex<VecDeque<String>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> StorageResult<MutexGuard<'_, VecDeque<String>>> {
        self.items
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl WorkQueue for MemoryQueue {
    fn push(&self, urls: &[String]) -> StorageResult<usize> {
        let mut items = self.items()?;
        let before = items.len();
        items.extend(
            urls.iter()
                .map(|url| url.trim())
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        );
        Ok(items.len() - before)
    }

    fn pop(&self) -> StorageResult<Option<String>> {
        Ok(self.items()?.pop_front())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.items()?.len() as u64)
    }

    fn clear(&self) -> StorageResult<u64> {
        let mut items = self.items()?;
        let removed = items.len() as u64;
        items.clear();
        Ok(removed)
    }
}
