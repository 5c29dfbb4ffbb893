//! Sharding wrapper: `N` independent maps, `shard = hash(key) mod N`.
//!
//! Grounded on `include/meta/caching/shard_cache.h`'s `generic_shard_cache`
//! (a `Vec<Map<Key,Value>>` plus `std::hash<Key>`); `splay_shard_cache`/
//! `dblru_shard_cache` are kept as Rust type aliases over [`SplayCache`] and
//! [`DblruCache`], same as the source's template aliases. Per-shard maps are
//! assumed self-synchronized (every [`Cache`] impl in this module is), so
//! cross-shard operations like `len` sum across shards with no additional
//! coordination.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::caching::{Cache, DblruCache, LockingMap, SplayCache};

pub struct ShardCache<K, V, M> {
    shards: Vec<M>,
    _marker: std::marker::PhantomData<(K, V)>,
}

impl<K, V, M> ShardCache<K, V, M>
where
    M: Cache<K, V> + Default,
{
    pub fn new(num_shards: u8) -> Self {
        let shards = (0..num_shards.max(1)).map(|_| M::default()).collect();
        ShardCache { shards, _marker: std::marker::PhantomData }
    }
}

impl<K: Hash, V, M> ShardCache<K, V, M> {
    fn shard_for(&self, key: &K) -> &M {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        &self.shards[idx]
    }
}

impl<K: Hash, V, M> Cache<K, V> for ShardCache<K, V, M>
where
    M: Cache<K, V>,
{
    fn insert(&self, key: K, value: V) {
        self.shard_for(&key).insert(key, value);
    }

    fn find(&self, key: &K) -> Option<V> {
        self.shard_for(key).find(key)
    }

    fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }

    fn len(&self) -> u64 {
        self.shards.iter().map(Cache::len).sum()
    }
}

pub type SplayShardCache<K, V> = ShardCache<K, V, SplayCache<K, V>>;
pub type DblruShardCache<K, V> = ShardCache<K, V, DblruCache<K, V, LockingMap<K, V>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distributes_and_finds_across_shards() {
        let cache: ShardCache<u32, u32, SplayCache<u32, u32>> = ShardCache::new(4);
        for i in 0..100 {
            cache.insert(i, i * 2);
        }
        assert_eq!(cache.len(), 100);
        for i in 0..100 {
            assert_eq!(cache.find(&i), Some(i * 2));
        }
    }
}
