//! Double-barrel LRU cache: amortized recency eviction without per-entry
//! bookkeeping.
//!
//! Grounded on `include/meta/caching/dblru_cache.h`: a primary and
//! secondary map, `find` promotes a secondary hit into primary, and once
//! `max_size` inserts have landed in primary the secondary is dropped,
//! primary demoted to secondary, and a fresh primary created. The source's
//! `std::shared_ptr<Map<Key,Value>>` snapshot-and-swap under an atomic/mutex
//! becomes `parking_lot::RwLock<Arc<M>>` here, matching the
//! lock-then-snapshot idiom this crate uses elsewhere for shared read-mostly
//! state.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::caching::{Cache, LockingMap};

pub struct DblruCache<K, V, M = LockingMap<K, V>> {
    max_size: u64,
    current_size: AtomicU64,
    primary: RwLock<Arc<M>>,
    secondary: RwLock<Arc<M>>,
    _marker: std::marker::PhantomData<(K, V)>,
}

impl<K, V, M> DblruCache<K, V, M>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: Cache<K, V> + Default,
{
    pub fn new(max_size: u64) -> Self {
        DblruCache {
            max_size,
            current_size: AtomicU64::new(0),
            primary: RwLock::new(Arc::new(M::default())),
            secondary: RwLock::new(Arc::new(M::default())),
            _marker: std::marker::PhantomData,
        }
    }
}

/// Matches the source's convention of a generous default primary-map size
/// for shard/cached-index use sites that don't specify one explicitly.
pub const DEFAULT_MAX_SIZE: u64 = 10_000;

impl<K, V, M> Default for DblruCache<K, V, M>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: Cache<K, V> + Default,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl<K, V, M> DblruCache<K, V, M>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: Cache<K, V> + Default,
{
    fn handle_insert(&self) {
        let size = self.current_size.fetch_add(1, Ordering::SeqCst) + 1;
        if size >= self.max_size {
            let mut primary = self.primary.write();
            let mut secondary = self.secondary.write();
            *secondary = Arc::clone(&primary);
            *primary = Arc::new(M::default());
            self.current_size.store(0, Ordering::SeqCst);
        }
    }
}

impl<K, V, M> Cache<K, V> for DblruCache<K, V, M>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: Cache<K, V> + Default,
{
    fn insert(&self, key: K, value: V) {
        self.primary.read().insert(key, value);
        self.handle_insert();
    }

    fn find(&self, key: &K) -> Option<V> {
        if let Some(value) = self.primary.read().find(key) {
            return Some(value);
        }
        let value = self.secondary.read().find(key)?;
        self.primary.read().insert(key.clone(), value.clone());
        Some(value)
    }

    fn clear(&self) {
        self.primary.read().clear();
        self.secondary.read().clear();
        self.current_size.store(0, Ordering::SeqCst);
    }

    fn len(&self) -> u64 {
        self.primary.read().len() + self.secondary.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_secondary_hits_to_primary() {
        let cache: DblruCache<u32, u32> = DblruCache::new(2);
        cache.insert(1, 1);
        cache.insert(2, 2);
        // max_size reached: primary demoted to secondary, primary now empty.
        assert_eq!(cache.find(&1), Some(1));
        assert_eq!(cache.find(&2), Some(2));
    }

    #[test]
    fn stale_entries_eventually_drop_out() {
        let cache: DblruCache<u32, u32> = DblruCache::new(2);
        cache.insert(1, 1);
        cache.insert(2, 2); // swap: {1,2} become secondary, primary empty
        cache.insert(3, 3);
        cache.insert(4, 4); // swap again: secondary becomes {3,4}; 1/2 dropped
        assert_eq!(cache.find(&1), None);
        assert_eq!(cache.find(&3), Some(3));
    }
}
