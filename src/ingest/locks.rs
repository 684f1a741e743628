//! Per-(paper, subject) write locks for stores without transactions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

/// Keyed async mutexes serializing replace operations on one subject bank.
///
/// Different keys never contend. Designed to be shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct SubjectLocks {
    /// Arc values let the guard outlive the `DashMap` shard lock.
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl SubjectLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns the lock for one (paper, subject) pair.
    #[instrument(skip(self))]
    pub async fn lock(&self, paper_id: &str, subject_id: &str) -> OwnedMutexGuard<()> {
        let key = (paper_id.to_string(), subject_id.to_string());
        // Clone the Arc so the shard lock is released before awaiting.
        let mutex = Arc::clone(self.locks.entry(key).or_default().value());
        let guard = mutex.lock_owned().await;
        debug!("subject lock acquired");
        guard
    }

    /// Number of pairs that have ever been locked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
