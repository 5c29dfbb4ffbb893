//! An unbounded cache -- never evicts anything.
//!
//! Grounded on the source's `no_evict_cache` (implied by `cached_index.h`'s
//! doc comment "useful if you're using something like no-evict cache and
//! want to reclaim memory" via `clear_cache()`); a thin wrapper over
//! [`LockingMap`] with no size bound.

use std::hash::Hash;

use crate::caching::{Cache, LockingMap};

pub struct NoEvictCache<K, V> {
    map: LockingMap<K, V>,
}

impl<K: Eq + Hash + Clone, V: Clone> Default for NoEvictCache<K, V> {
    fn default() -> Self {
        NoEvictCache { map: LockingMap::new() }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> NoEvictCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> for NoEvictCache<K, V> {
    fn insert(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    fn find(&self, key: &K) -> Option<V> {
        self.map.find(key)
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn len(&self) -> u64 {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_evicts() {
        let cache: NoEvictCache<u32, u32> = NoEvictCache::new();
        for i in 0..1000 {
            cache.insert(i, i * 2);
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.find(&999), Some(1998));
    }
}
