//! A plain hash map behind a mutex.
//!
//! Grounded on `include/meta/caching/maps/locking_map.h`: a
//! `std::unordered_map` paired with a `std::mutex`, here `HashMap` paired
//! with `parking_lot::Mutex`.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::caching::Cache;

pub struct LockingMap<K, V> {
    map: Mutex<HashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> Default for LockingMap<K, V> {
    fn default() -> Self {
        LockingMap {
            map: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> LockingMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> for LockingMap<K, V> {
    fn insert(&self, key: K, value: V) {
        self.map.lock().insert(key, value);
    }

    fn find(&self, key: &K) -> Option<V> {
        self.map.lock().get(key).cloned()
    }

    fn clear(&self) {
        self.map.lock().clear();
    }

    fn len(&self) -> u64 {
        self.map.lock().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_and_finds() {
        let map: LockingMap<u32, String> = LockingMap::new();
        map.insert(1, "one".to_owned());
        assert_eq!(map.find(&1), Some("one".to_owned()));
        assert_eq!(map.find(&2), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn clear_empties_the_map() {
        let map: LockingMap<u32, u32> = LockingMap::new();
        map.insert(1, 1);
        map.clear();
        assert!(map.is_empty());
    }
}
