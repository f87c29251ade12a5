//! Thread-safe aggregation primitives shared by loader worker threads.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Monotonically incrementing counter.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicUsize,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter and returns the updated value.
    pub fn increment(&self) -> usize {
        self.increment_by(1)
    }

    pub fn increment_by(&self, amount: usize) -> usize {
        self.value.fetch_add(amount, Ordering::AcqRel) + amount
    }

    pub fn value(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }
}

/// Mutually exclusive key-value map written concurrently by worker tasks.
#[derive(Debug)]
pub struct ConcurrentMap<K, V> {
    inner: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> ConcurrentMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts a value, returning the previous value for the key if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.lock().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Takes every entry out of the map, leaving it empty.
    pub fn drain(&self) -> HashMap<K, V> {
        std::mem::take(&mut *self.lock())
    }
}

impl<K: Eq + Hash, V: Clone> ConcurrentMap<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{AtomicCounter, ConcurrentMap};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_aggregates_increments_from_many_threads() {
        let counter = Arc::new(AtomicCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..100 {
                        counter.increment();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker should finish");
        }
        assert_eq!(counter.value(), 800);
    }

    #[test]
    fn test_concurrent_map_collects_results_from_workers() {
        let map = Arc::new(ConcurrentMap::new());
        let handles: Vec<_> = (0..4usize)
            .map(|worker| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    map.insert(worker, worker * 10);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker should finish");
        }
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(&3), Some(30));
        let drained = map.drain();
        assert_eq!(drained.len(), 4);
        assert!(map.is_empty());
    }
}
