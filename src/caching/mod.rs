//! Cache layer: four interchangeable caching strategies plus a decorator
//! that wraps a disk index's `search_primary` with one of them (§4.8).
//!
//! Grounded on `include/meta/caching/*.h`: every concrete cache here
//! implements the same [`Cache`] surface (`insert`/`find`/`clear`), mirroring
//! how the source's `dblru_cache`/`shard_cache` are templated over an
//! interchangeable `Map` parameter rather than a common base class.

pub mod cached_index;
pub mod dblru_cache;
pub mod locking_map;
pub mod no_evict_cache;
pub mod shard_cache;
pub mod splay_cache;

pub use cached_index::CachedIndex;
pub use dblru_cache::DblruCache;
pub use locking_map::LockingMap;
pub use no_evict_cache::NoEvictCache;
pub use shard_cache::ShardCache;
pub use splay_cache::SplayCache;

/// A key/value cache, internally synchronized so it can be shared behind a
/// shared reference. Grounded on the common surface of `locking_map`,
/// `splay_cache`, `dblru_cache`, and `shard_cache` in the source, none of
/// which share a base class but all of which expose `insert`/`find`/`clear`.
pub trait Cache<K, V> {
    fn insert(&self, key: K, value: V);
    fn find(&self, key: &K) -> Option<V>;
    fn clear(&self);
    fn len(&self) -> u64;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
