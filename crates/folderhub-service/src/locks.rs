//! Per-owner serialization of structural mutations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use folderhub_core::types::OwnerId;

type LockTable = DashMap<OwnerId, Arc<Mutex<()>>>;

/// One async mutex per owner.
///
/// Held across the read-plan-write window of every structural change so
/// two renames or moves in the same tree never interleave their cascades.
/// An owner's entry is dropped once nobody holds or waits for its lock.
#[derive(Debug, Clone, Default)]
pub struct OwnerLocks {
    locks: Arc<LockTable>,
}

/// Holds an owner's lock; releasing it evicts the entry when idle.
#[derive(Debug)]
pub struct OwnerGuard {
    owner_id: OwnerId,
    locks: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold their own clone of the Arc, so a count of one means
        // only the table still references the mutex.
        self.locks
            .remove_if(&self.owner_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl OwnerLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock for `owner_id`.
    pub async fn acquire(&self, owner_id: OwnerId) -> OwnerGuard {
        let lock = self.locks.entry(owner_id).or_default().clone();
        let guard = lock.lock_owned().await;
        OwnerGuard {
            owner_id,
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Number of owners with a held or awaited lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns `true` if no lock is held or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
