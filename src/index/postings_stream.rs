//! A lazily-decoded view of one postings list, for reading a term's (or a
//! document's, for the forward index) postings without materializing a
//! `PostingsData` map.
//!
//! Grounded on `include/meta/index/postings_stream.h`: `size_`/
//! `total_counts_` are read once at construction, and `iterator::operator++`
//! gap-decodes one `(SecondaryKey, FeatureValue)` pair at a time
//! (`count_.first += id`).

use std::io;
use std::marker::PhantomData;

use crate::packed_io::{self, PackedValue, SliceCursor};
use crate::types::GapKey;

pub struct PostingsStream<'a, S, V> {
    body: &'a [u8],
    size: u64,
    total_counts: V,
    _marker: PhantomData<S>,
}

impl<'a, S: GapKey, V: PackedValue> PostingsStream<'a, S, V> {
    /// `bytes` must start at the `packed_u64(size)` header of a postings
    /// record (as written by `PostingsData::write_packed`).
    pub fn new(bytes: &'a [u8]) -> io::Result<Self> {
        let mut cursor = SliceCursor::new(bytes);
        let size = packed_io::read_u64(&mut cursor)?;
        let total_counts = V::read_packed(&mut cursor)?;
        Ok(PostingsStream {
            body: cursor.remaining(),
            size,
            total_counts,
            _marker: PhantomData,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn total_counts(&self) -> V {
        self.total_counts
    }

    pub fn iter(&self) -> PostingsStreamIter<'a, S, V> {
        PostingsStreamIter {
            cursor: SliceCursor::new(self.body),
            size: self.size,
            pos: 0,
            last_key: 0,
            _marker: PhantomData,
        }
    }
}

impl<'a, S: GapKey, V: PackedValue> IntoIterator for &PostingsStream<'a, S, V> {
    type Item = (S, V);
    type IntoIter = PostingsStreamIter<'a, S, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct PostingsStreamIter<'a, S, V> {
    cursor: SliceCursor<'a>,
    size: u64,
    pos: u64,
    last_key: u64,
    _marker: PhantomData<(S, V)>,
}

impl<'a, S: GapKey, V: PackedValue> Iterator for PostingsStreamIter<'a, S, V> {
    type Item = (S, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos == self.size {
            return None;
        }
        let gap = packed_io::read_u64(&mut self.cursor).ok()?;
        self.last_key += gap;
        let value = V::read_packed(&mut self.cursor).ok()?;
        self.pos += 1;
        Some((S::from_u64(self.last_key), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::postings_data::PostingsData;
    use crate::types::DocId;

    #[test]
    fn round_trips_through_postings_data() {
        let mut pd: PostingsData<DocId, u64> = PostingsData::new();
        pd.increase_count(DocId::new(1), 7);
        pd.increase_count(DocId::new(5), 2);
        pd.increase_count(DocId::new(6), 1);

        let mut buf = Vec::new();
        pd.write_packed(&mut buf).unwrap();

        let stream = PostingsStream::<DocId, u64>::new(&buf).unwrap();
        assert_eq!(stream.size(), 3);
        assert_eq!(stream.total_counts(), 10);

        let pairs: Vec<(DocId, u64)> = stream.iter().collect();
        assert_eq!(
            pairs,
            vec![(DocId::new(1), 7), (DocId::new(5), 2), (DocId::new(6), 1)]
        );
    }

    #[test]
    fn empty_stream_yields_no_pairs() {
        let pd: PostingsData<DocId, u64> = PostingsData::new();
        let mut buf = Vec::new();
        pd.write_packed(&mut buf).unwrap();

        let stream = PostingsStream::<DocId, u64>::new(&buf).unwrap();
        assert_eq!(stream.size(), 0);
        assert_eq!(stream.iter().count(), 0);
    }
}
