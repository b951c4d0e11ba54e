//! Per-election mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry handing out one async lock per election id.
///
/// Vote fan-out and every cast-then-evaluate sequence hold the election's
/// guard, so two votes landing on the last pending slots cannot both miss
/// (or both fire) the close trigger.
#[derive(Clone, Default)]
pub struct ElectionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ElectionLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, election_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(election_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to an election.
    pub async fn lock(&self, election_id: &str) -> ElectionGuard {
        let guard = self.entry(election_id).lock_owned().await;
        ElectionGuard {
            guard: Some(guard),
            registry: self.clone(),
            election_id: election_id.to_string(),
        }
    }

    /// Remove the entry once nobody holds or waits on it.
    fn release(&self, election_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(election_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(election_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one election, released on drop.
pub struct ElectionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    registry: ElectionLocks,
    election_id: String,
}

impl Drop for ElectionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry.release(&self.election_id);
    }
}
