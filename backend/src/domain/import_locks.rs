use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// One async mutex per user id, so imports for the same user run one at a time
#[derive(Clone, Default)]
pub struct ImportLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl ImportLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the user's import lock. The lock is released when the guard drops.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries referenced only by the map have no holder or waiter
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };

        debug!("Waiting for import lock of user {}", user_id);
        lock.lock_owned().await
    }

    /// Number of users with a held or awaited lock
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
