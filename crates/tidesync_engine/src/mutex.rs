//! Per-key mutual exclusion for sync runs.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// An async mutex map keyed by a composite resource key.
///
/// At most one sync runs per key. A second caller for the same key suspends
/// until the first finishes and then re-evaluates staleness itself,
/// typically finding the data now fresh and no-oping; that collapses
/// duplicate concurrent requests for identical resources while unrelated
/// keys proceed fully in parallel. Singleton resources can use a plain
/// [`tokio::sync::Mutex`] instead.
///
/// A handler holds its keyed guard for the whole run so waiters re-check
/// staleness behind it; the store's write lock is only taken for the final
/// merge/write step, never across a network round trip.
pub struct KeyedMutex<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedMutex<K> {
    /// Creates an empty mutex map.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires the lock for `key`, suspending while another caller holds
    /// it.
    pub async fn lock(&self, key: K) -> KeyedMutexGuard {
        let lock = {
            let mut locks = self.locks.lock();
            // drop entries nobody holds or waits on before growing the map
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key).or_default())
        };
        KeyedMutexGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// True if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedMutex<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`KeyedMutex::lock`]; the key unlocks on drop.
pub struct KeyedMutexGuard {
    _guard: OwnedMutexGuard<()>,
}
