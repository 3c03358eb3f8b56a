//! Per-key mutual exclusion for workflow steps.

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

use crate::identity::StorageKey;

/// One mutex per storage key.
///
/// Steps on the same `(caller, filename)` run one at a time; steps on
/// different keys never wait on each other. An entry only lives while a
/// step holds or waits for it.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Exclusive access to one key, released on drop.
pub struct KeyGuard<'a> {
    owner: &'a KeyLocks,
    key: String,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free, then hold it until the guard drops.
    pub fn acquire(&self, key: &StorageKey) -> KeyGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock();
            locks
                .entry(key.as_str().to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        KeyGuard {
            owner: self,
            key: key.as_str().to_string(),
            guard: Some(mutex.lock_arc()),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &str) {
        let mut locks = self.locks.lock();
        // Only the map's own handle left: nobody holds or waits on this key
        if locks.get(key).is_some_and(|m| Arc::strong_count(m) == 1) {
            locks.remove(key);
        }
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner.release(&self.key);
    }
}
