//! Decorator that wraps a disk index's `search_primary` with a cache.
//!
//! Grounded on `include/meta/index/cached_index.h`: a `cached_index<Index,
//! Cache>` overriding `search_primary` to check the cache first, falling
//! through to the base index on miss and storing the result. The source
//! caches `std::shared_ptr<postings_data_type>`; this crate uses `Arc` for
//! the same cache-hit-avoids-clone benefit, following the `Arc<Vec<RowId>>`
//! convention this crate's pack attests to for row-cache-style decorators.

use std::hash::Hash;
use std::sync::Arc;

use crate::caching::Cache;
use crate::index::postings_data::PostingsData;

/// Implemented by the two concrete disk indexes so [`CachedIndex`] can wrap
/// either one generically. `search_primary_uncached` is the index's
/// unmediated lookup -- the thing the cache sits in front of.
pub trait PrimarySearch {
    type PrimaryKey: Copy + Eq + Hash;
    type SecondaryKey;
    type Value;

    fn search_primary_uncached(
        &self,
        p_id: Self::PrimaryKey,
    ) -> Option<PostingsData<Self::SecondaryKey, Self::Value>>;
}

pub struct CachedIndex<Idx, C> {
    index: Idx,
    cache: C,
}

impl<Idx, C> CachedIndex<Idx, C>
where
    Idx: PrimarySearch,
    C: Cache<Idx::PrimaryKey, Arc<PostingsData<Idx::SecondaryKey, Idx::Value>>>,
{
    pub fn new(index: Idx, cache: C) -> Self {
        CachedIndex { index, cache }
    }

    pub fn index(&self) -> &Idx {
        &self.index
    }

    /// Checks the cache for `p_id`; on miss, falls through to the base
    /// index, installs the result, and returns it.
    pub fn search_primary(
        &self,
        p_id: Idx::PrimaryKey,
    ) -> Option<Arc<PostingsData<Idx::SecondaryKey, Idx::Value>>> {
        if let Some(cached) = self.cache.find(&p_id) {
            return Some(cached);
        }
        let found = Arc::new(self.index.search_primary_uncached(p_id)?);
        self.cache.insert(p_id, Arc::clone(&found));
        Some(found)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::NoEvictCache;
    use crate::types::{DocId, TermId};
    use std::cell::Cell;

    struct CountingIndex {
        calls: Cell<u32>,
    }

    impl PrimarySearch for CountingIndex {
        type PrimaryKey = TermId;
        type SecondaryKey = DocId;
        type Value = u64;

        fn search_primary_uncached(&self, p_id: TermId) -> Option<PostingsData<DocId, u64>> {
            self.calls.set(self.calls.get() + 1);
            let mut pdata = PostingsData::new();
            pdata.increase_count(DocId::new(p_id.get()), 1);
            Some(pdata)
        }
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let index = CountingIndex { calls: Cell::new(0) };
        let cached = CachedIndex::new(index, NoEvictCache::new());

        let first = cached.search_primary(TermId::new(7)).unwrap();
        let second = cached.search_primary(TermId::new(7)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cached.index().calls.get(), 1);
    }

    #[test]
    fn clear_cache_forces_a_refetch() {
        let index = CountingIndex { calls: Cell::new(0) };
        let cached = CachedIndex::new(index, NoEvictCache::new());

        cached.search_primary(TermId::new(1));
        cached.clear_cache();
        cached.search_primary(TermId::new(1));

        assert_eq!(cached.index().calls.get(), 2);
    }
}
