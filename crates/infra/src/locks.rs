//! Per-key write serialization.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per key, created on first use.
///
/// Mutations of the same record run one at a time; different records proceed
/// in parallel. Combined with the repositories' version check this gives the
/// per-item / per-order atomicity the ledger and receiving rules require.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// Poisoned slots are recovered; the guarded state lives in the
    /// repository, not in the mutex.
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key.clone()).or_default().clone()
        };
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding the locks for every key in `keys`.
    ///
    /// Locks are taken in key order so overlapping batches cannot deadlock.
    pub fn with_locks<R>(&self, keys: &[K], f: impl FnOnce() -> R) -> R
    where
        K: Ord,
    {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let slots: Vec<Arc<Mutex<()>>> = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            keys.iter()
                .map(|k| slots.entry(k.clone()).or_default().clone())
                .collect()
        };
        let _guards: Vec<_> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        f()
    }

    /// Drop the slot for a deleted record.
    pub fn forget(&self, key: &K) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::thread;

    #[test]
    fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let in_section = Arc::new(AtomicI64::new(0));
        let max_seen = Arc::new(AtomicI64::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let in_section = in_section.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        locks.with_lock(&1, || {
                            let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            in_section.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn overlapping_batches_do_not_deadlock() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let total = Arc::new(AtomicI64::new(0));

        let handles: Vec<_> = [vec![1, 2, 3], vec![3, 2, 1], vec![2, 2, 3]]
            .into_iter()
            .map(|keys| {
                let locks = locks.clone();
                let total = total.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        locks.with_locks(&keys, || total.fetch_add(1, Ordering::SeqCst));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(total.load(Ordering::SeqCst), 300);
        assert_eq!(locks.len(), 3);
    }

    #[test]
    fn forget_releases_the_slot() {
        let locks = KeyedLocks::<&str>::new();
        locks.with_lock(&"a", || ());
        locks.with_lock(&"b", || ());
        assert_eq!(locks.len(), 2);

        locks.forget(&"a");
        assert_eq!(locks.len(), 1);
    }
}
