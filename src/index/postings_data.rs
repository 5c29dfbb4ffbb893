//! In-memory per-primary-key postings: a sorted `SecondaryKey -> FeatureValue`
//! map and its packed-gap serialization.
//!
//! Grounded on `include/index/postings_data.h` for the shape (a primary
//! key's counts keyed by secondary key) and on `include/index/postings_file_writer.h::write`
//! for the exact wire format, which requires counts to be visited in
//! ascending secondary-key order (`count.first - last_id` must stay
//! non-negative) -- hence `BTreeMap` rather than the older unordered-map
//! sketch in `postings_data.h`.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::ops::AddAssign;

use crate::packed_io::{self, PackedValue};
use crate::types::GapKey;

/// `size`/`total_counts`/`(gap, value)*` format pinned by the data model:
/// `packed_u64(size)`, `packed_value(total_counts)`, then `size` repeats of
/// `packed_u64(gap)` `packed_value(value)`.
#[derive(Clone, Debug, Default)]
pub struct PostingsData<S, V> {
    counts: BTreeMap<S, V>,
}

impl<S: GapKey, V: PackedValue + Default + AddAssign> PostingsData<S, V> {
    pub fn new() -> Self {
        PostingsData {
            counts: BTreeMap::new(),
        }
    }

    /// Adds `amount` to the count for `key`, inserting it at zero first if
    /// absent.
    pub fn increase_count(&mut self, key: S, amount: V) {
        let entry = self.counts.entry(key).or_insert_with(V::default);
        *entry += amount;
    }

    pub fn count(&self, key: S) -> V {
        self.counts.get(&key).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<S, V> {
        &self.counts
    }

    /// Sum of all counts -- the document frequency weighted total for this
    /// primary key (e.g. the total number of occurrences of a term across
    /// the corpus).
    pub fn total_counts(&self) -> V {
        let mut total = V::default();
        for &value in self.counts.values() {
            total += value;
        }
        total
    }

    /// Merges another primary key's counts into this one, summing where a
    /// secondary key appears in both (used by chunk merging, where the same
    /// term can accumulate postings split across independently-flushed
    /// chunks).
    pub fn merge_from(&mut self, other: &PostingsData<S, V>) {
        for (&key, &value) in &other.counts {
            self.increase_count(key, value);
        }
    }

    /// Decodes a record written by [`write_packed`](Self::write_packed).
    pub fn read_packed<R: Read>(input: &mut R) -> io::Result<Self> {
        let size = packed_io::read_u64(input)?;
        let _total_counts = V::read_packed(input)?;
        let mut counts = BTreeMap::new();
        let mut last_key = 0u64;
        for _ in 0..size {
            let gap = packed_io::read_u64(input)?;
            last_key += gap;
            let value = V::read_packed(input)?;
            counts.insert(S::from_u64(last_key), value);
        }
        Ok(PostingsData { counts })
    }

    /// Serializes in the pinned gap-encoded format, returning the number of
    /// bytes written.
    pub fn write_packed<W: Write>(&self, out: &mut W) -> io::Result<u64> {
        let mut bytes = packed_io::write_u64(out, self.counts.len() as u64)? as u64;
        bytes += self.total_counts().write_packed(out)? as u64;

        let mut last_key = 0u64;
        for (&key, &value) in &self.counts {
            let key = key.as_u64();
            bytes += packed_io::write_u64(out, key - last_key)? as u64;
            bytes += value.write_packed(out)? as u64;
            last_key = key;
        }
        Ok(bytes)
    }
}
