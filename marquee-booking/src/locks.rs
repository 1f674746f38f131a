use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[error("Timed out after {waited:?} waiting for showtime {showtime_id}")]
pub struct LockTimeout {
    pub showtime_id: Uuid,
    pub waited: Duration,
}

/// One async mutex per showtime, created on first use and kept for the life of
/// the process. Holds on different showtimes never wait on each other.
#[derive(Default)]
pub struct ShowtimeLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl ShowtimeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, showtime_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(showtime_id).or_default().clone()
    }

    /// Waits at most `timeout` for exclusive access to the showtime.
    pub async fn acquire(
        &self,
        showtime_id: Uuid,
        timeout: Duration,
    ) -> Result<OwnedMutexGuard<()>, LockTimeout> {
        let lock = self.lock_for(showtime_id);
        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| LockTimeout {
                showtime_id,
                waited: timeout,
            })
    }

    /// Number of showtimes that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
