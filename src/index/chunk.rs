//! External-memory chunk construction and k-way merge.
//!
//! Grounded on the shape implicit in `include/meta/index/postings_stream.h`
//! (lazy decode-as-you-iterate, reused here for reading back a chunk file).
//! The merge follows a standard sorted-run discipline: accumulate postings
//! in memory up to a size limit, flush a sorted run to disk, then
//! repeatedly merge pairs of runs (smallest-first) until one sorted run
//! remains. A single `ChunkHandler` is meant to be owned by one worker
//! thread; concurrent construction runs one per worker and merges all of
//! their chunk files together at the end (§9 resolution: no cross-thread
//! chunk-id coordination needed).

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::index::postings_data::PostingsData;
use crate::packed_io::{self, PackedValue};
use crate::types::{DocId, GapKey, TermId};

/// Docs of buffered postings before a chunk is flushed, when no explicit
/// limit is configured.
pub const DEFAULT_MAX_BUFFER_DOCS: u64 = 10_000;

/// A primary key a chunk file can be keyed by: term text during the initial
/// indexing pass (ids are not yet assigned), or a doc/term id during the
/// forward-index transpose pass (ids already exist).
pub trait ChunkKey: Ord + Clone {
    fn write_key<W: Write>(&self, out: &mut W) -> io::Result<usize>;
    fn read_key<R: io::Read>(input: &mut R) -> io::Result<Self>;
}

impl ChunkKey for String {
    fn write_key<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        packed_io::write_cstr(out, self)
    }

    fn read_key<R: io::Read>(input: &mut R) -> io::Result<Self> {
        packed_io::read_cstr(input)
    }
}

impl ChunkKey for DocId {
    fn write_key<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        packed_io::write_u64(out, self.get())
    }

    fn read_key<R: io::Read>(input: &mut R) -> io::Result<Self> {
        Ok(DocId::new(packed_io::read_u64(input)?))
    }
}

impl ChunkKey for TermId {
    fn write_key<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        packed_io::write_u64(out, self.get())
    }

    fn read_key<R: io::Read>(input: &mut R) -> io::Result<Self> {
        Ok(TermId::new(packed_io::read_u64(input)?))
    }
}

/// Accumulates `primary key -> postings` in memory, flushing sorted runs
/// ("chunks") to disk when a buffer limit is reached.
pub struct ChunkHandler<K, S, V> {
    chunk_dir: PathBuf,
    prefix: String,
    buffer: BTreeMap<K, PostingsData<S, V>>,
    buffered_docs: u64,
    max_buffer_docs: Option<u64>,
    max_buffer_bytes: Option<u64>,
    chunk_paths: Vec<PathBuf>,
    next_chunk: u64,
}

impl<K: ChunkKey, S: GapKey, V: PackedValue + Default + AddAssign> ChunkHandler<K, S, V> {
    pub fn new(
        chunk_dir: impl AsRef<Path>,
        prefix: impl Into<String>,
        max_buffer_docs: Option<u64>,
        max_buffer_bytes: Option<u64>,
    ) -> Self {
        let (max_buffer_docs, max_buffer_bytes) = match (max_buffer_docs, max_buffer_bytes) {
            (None, None) => (Some(DEFAULT_MAX_BUFFER_DOCS), None),
            other => other,
        };
        ChunkHandler {
            chunk_dir: chunk_dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
            buffer: BTreeMap::new(),
            buffered_docs: 0,
            max_buffer_docs,
            max_buffer_bytes,
            chunk_paths: Vec::new(),
            next_chunk: 0,
        }
    }

    /// Adds one `(key, secondary, amount)` observation, flushing the
    /// buffer to a new chunk file first if a configured limit is exceeded.
    pub fn increase_count(&mut self, key: K, secondary: S, amount: V) -> Result<()> {
        self.buffer
            .entry(key)
            .or_insert_with(PostingsData::new)
            .increase_count(secondary, amount);
        self.buffered_docs += 1;

        let over_docs = self.max_buffer_docs.is_some_and(|limit| self.buffered_docs >= limit);
        let over_bytes = self.max_buffer_bytes.is_some_and(|limit| self.estimate_bytes() >= limit);
        if over_docs || over_bytes {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn estimate_bytes(&self) -> u64 {
        self.buffer
            .values()
            .map(|pdata| pdata.len() as u64 * 16 + 16)
            .sum()
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let path = self.chunk_dir.join(format!("{}-{}.chunk", self.prefix, self.next_chunk));
        self.next_chunk += 1;

        let mut writer = BufWriter::new(File::create(&path).map_err(|e| MetaError::io_error(&path, e))?);
        for (key, pdata) in &self.buffer {
            key.write_key(&mut writer).map_err(|e| MetaError::io_error(&path, e))?;
            pdata.write_packed(&mut writer).map_err(|e| MetaError::io_error(&path, e))?;
        }
        writer.flush().map_err(|e| MetaError::io_error(&path, e))?;

        self.buffer.clear();
        self.buffered_docs = 0;
        self.chunk_paths.push(path);
        Ok(())
    }

    /// Flushes any remaining buffered postings and returns the paths of all
    /// chunk files produced so far (unmerged).
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.flush_buffer()?;
        Ok(self.chunk_paths)
    }
}

/// A lazy, forward-only reader over one chunk file's `(key, postings)*`
/// records, mirroring `postings_stream`'s decode-as-you-iterate shape.
struct ChunkIterator<K, S, V> {
    reader: BufReader<File>,
    path: PathBuf,
    done: bool,
    _marker: std::marker::PhantomData<(K, S, V)>,
}

impl<K: ChunkKey, S: GapKey, V: PackedValue + Default + AddAssign> ChunkIterator<K, S, V> {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        Ok(ChunkIterator {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            done: false,
            _marker: std::marker::PhantomData,
        })
    }
}

impl<K: ChunkKey, S: GapKey, V: PackedValue + Default + AddAssign> Iterator for ChunkIterator<K, S, V> {
    type Item = (K, PostingsData<S, V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match K::read_key(&mut self.reader) {
            Ok(key) => {
                let pdata = PostingsData::read_packed(&mut self.reader).expect("corrupt chunk file");
                Some((key, pdata))
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.done = true;
                None
            }
            Err(e) => panic!("corrupt chunk file {}: {e}", self.path.display()),
        }
    }
}

struct ChunkBySize {
    path: PathBuf,
    size: u64,
}

impl PartialEq for ChunkBySize {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
    }
}
impl Eq for ChunkBySize {}
impl PartialOrd for ChunkBySize {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ChunkBySize {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.size.cmp(&other.size)
    }
}

/// Repeatedly merges the two smallest chunk files until one sorted run
/// remains, returning its path. `paths` must be non-empty.
pub fn merge_chunks<K, S, V>(paths: Vec<PathBuf>, dest_dir: impl AsRef<Path>, prefix: &str) -> Result<PathBuf>
where
    K: ChunkKey,
    S: GapKey,
    V: PackedValue + Default + AddAssign,
{
    let dest_dir = dest_dir.as_ref();
    assert!(!paths.is_empty(), "merge_chunks requires at least one chunk");

    let mut heap = BinaryHeap::new();
    for path in paths {
        let size = fs::metadata(&path).map_err(|e| MetaError::io_error(&path, e))?.len();
        heap.push(Reverse(ChunkBySize { path, size }));
    }

    let mut merge_num = 0u64;
    while heap.len() > 1 {
        let Reverse(a) = heap.pop().unwrap();
        let Reverse(b) = heap.pop().unwrap();

        let merged_path = dest_dir.join(format!("{prefix}-merge-{merge_num}.chunk"));
        merge_num += 1;
        merge_two::<K, S, V>(&a.path, &b.path, &merged_path)?;

        fs::remove_file(&a.path).map_err(|e| MetaError::io_error(&a.path, e))?;
        fs::remove_file(&b.path).map_err(|e| MetaError::io_error(&b.path, e))?;

        let size = fs::metadata(&merged_path).map_err(|e| MetaError::io_error(&merged_path, e))?.len();
        heap.push(Reverse(ChunkBySize { path: merged_path, size }));
    }

    Ok(heap.pop().unwrap().0.path)
}

fn merge_two<K, S, V>(a_path: &Path, b_path: &Path, dest_path: &Path) -> Result<()>
where
    K: ChunkKey,
    S: GapKey,
    V: PackedValue + Default + AddAssign,
{
    let mut a = ChunkIterator::<K, S, V>::open(a_path)?.peekable();
    let mut b = ChunkIterator::<K, S, V>::open(b_path)?.peekable();

    let mut out = BufWriter::new(File::create(dest_path).map_err(|e| MetaError::io_error(&dest_path.to_path_buf(), e))?);

    loop {
        let next = match (a.peek(), b.peek()) {
            (None, None) => break,
            (Some(_), None) => a.next(),
            (None, Some(_)) => b.next(),
            (Some((ak, _)), Some((bk, _))) => {
                if ak < bk {
                    a.next()
                } else if bk < ak {
                    b.next()
                } else {
                    let (key, mut pa) = a.next().unwrap();
                    let (_, pb) = b.next().unwrap();
                    pa.merge_from(&pb);
                    Some((key, pa))
                }
            }
        };
        let (key, pdata) = next.expect("checked non-empty above");
        key.write_key(&mut out)
            .map_err(|e| MetaError::io_error(&dest_path.to_path_buf(), e))?;
        pdata
            .write_packed(&mut out)
            .map_err(|e| MetaError::io_error(&dest_path.to_path_buf(), e))?;
    }

    out.flush().map_err(|e| MetaError::io_error(&dest_path.to_path_buf(), e))?;
    Ok(())
}

/// Iterates a fully-merged chunk file's `(key, postings)` records in sorted
/// key order -- the input to vocabulary map / postings file construction.
pub fn read_merged_chunk<K, S, V>(path: &Path) -> Result<Vec<(K, PostingsData<S, V>)>>
where
    K: ChunkKey,
    S: GapKey,
    V: PackedValue + Default + AddAssign,
{
    Ok(ChunkIterator::<K, S, V>::open(path)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocId;

    #[test]
    fn flushes_and_merges_chunks_in_sorted_key_order() {
        let dir = tempfile::tempdir().unwrap();

        let mut handler: ChunkHandler<String, DocId, u64> =
            ChunkHandler::new(dir.path(), "terms", Some(2), None);
        handler.increase_count("zebra".to_owned(), DocId::new(0), 1).unwrap();
        handler.increase_count("apple".to_owned(), DocId::new(0), 1).unwrap();
        // buffer now has 2 docs (threshold 2) -> flushed after this insert
        handler.increase_count("mango".to_owned(), DocId::new(1), 2).unwrap();
        handler.increase_count("apple".to_owned(), DocId::new(1), 3).unwrap();

        let chunks = handler.finish().unwrap();
        assert_eq!(chunks.len(), 2);

        let merged = merge_chunks::<String, DocId, u64>(chunks, dir.path(), "terms").unwrap();
        let records: Vec<(String, PostingsData<DocId, u64>)> = read_merged_chunk(&merged).unwrap();

        let keys: Vec<&str> = records.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["apple", "mango", "zebra"]);

        let apple = records.iter().find(|(k, _)| k == "apple").unwrap();
        assert_eq!(apple.1.count(DocId::new(0)), 1);
        assert_eq!(apple.1.count(DocId::new(1)), 3);
    }

    #[test]
    fn single_chunk_merge_is_a_no_op_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler: ChunkHandler<String, DocId, u64> = ChunkHandler::new(dir.path(), "only", None, None);
        handler.increase_count("solo".to_owned(), DocId::new(0), 5).unwrap();
        let chunks = handler.finish().unwrap();
        assert_eq!(chunks.len(), 1);

        let merged = merge_chunks::<String, DocId, u64>(chunks, dir.path(), "only").unwrap();
        let records: Vec<(String, PostingsData<DocId, u64>)> = read_merged_chunk(&merged).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "solo");
    }
}
