//! A hand-rolled B+-tree-like on-disk vocabulary map: string term -> `TermId`
//! and back, read via `mmap`.
//!
//! Grounded on `include/meta/index/vocabulary_map.h` /
//! `src/index/vocabulary_map.cpp` (reader) and
//! `src/index/vocabulary_map_writer.cpp` (writer). The file format is a
//! sequence of fixed-size blocks: leaf blocks hold
//! `(term: NUL-terminated str, term_id: packed u64)` records in sorted
//! order, zero-padded to `block_size`; internal blocks hold
//! `(first_term_of_child: NUL-terminated str, child_byte_offset: packed
//! u64)` records. The writer appends leaf blocks as terms are inserted (in
//! sorted order -- the caller's responsibility), then on `finish()` runs a
//! promotion pass that re-reads the most-recently-written level block by
//! block, writing one internal-node head record per block until a single
//! root block remains.
//!
//! Unlike the source, term ids and child offsets are packed varints rather
//! than fixed 8-byte words (this repo's on-disk convention, see
//! `packed_io`), so record lengths must be computed by encoding rather than
//! assumed from `sizeof(uint64_t)`.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::packed_io::{self, SliceCursor};
use crate::types::TermId;
use crate::util::disk_vector::{DiskVector, DiskVectorWriter};
use crate::util::mmap_file::MmapFile;

pub const DEFAULT_BLOCK_SIZE: u64 = 4096;

fn inverse_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(OsString::from(".inverse"));
    PathBuf::from(name)
}

/// Sequential writer: terms must be inserted in ascending sorted order
/// (the vocabulary-building driver is responsible for sorting).
pub struct VocabularyMapWriter {
    file: BufWriter<File>,
    file_path: PathBuf,
    inverse: DiskVectorWriter<u64>,
    block_size: u64,
    num_terms: u64,
    remaining_block_space: u64,
    file_write_pos: u64,
    written_nodes: u64,
}

impl VocabularyMapWriter {
    pub fn create(path: impl AsRef<Path>, block_size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| MetaError::io_error(&path, e))?;
        let inverse = DiskVectorWriter::<u64>::create(inverse_path(&path))?;
        Ok(VocabularyMapWriter {
            file: BufWriter::new(file),
            file_path: path,
            inverse,
            block_size,
            num_terms: 0,
            remaining_block_space: block_size,
            file_write_pos: 0,
            written_nodes: 0,
        })
    }

    /// Inserts the next term in sorted order, assigning it the next
    /// sequential `TermId`.
    pub fn insert(&mut self, term: &str) -> Result<()> {
        if term.is_empty() {
            return Err(MetaError::IndexFormat(
                "empty string cannot be inserted into the vocabulary map".to_owned(),
            ));
        }

        let mut record = Vec::new();
        packed_io::write_cstr(&mut record, term).map_err(|e| MetaError::io_error(&self.file_path, e))?;
        packed_io::write_u64(&mut record, self.num_terms)
            .map_err(|e| MetaError::io_error(&self.file_path, e))?;
        let length = record.len() as u64;

        if length > self.block_size {
            return Err(MetaError::IndexFormat(format!(
                "term \"{term}\" does not fit in a single {}-byte block",
                self.block_size
            )));
        }

        if length > self.remaining_block_space {
            self.write_padding()?;
            self.written_nodes += 1;
        }

        self.inverse.push(self.file_write_pos)?;
        self.file
            .write_all(&record)
            .map_err(|e| MetaError::io_error(&self.file_path, e))?;

        self.file_write_pos += length;
        self.remaining_block_space -= length;
        self.num_terms += 1;
        Ok(())
    }

    fn write_padding(&mut self) -> Result<()> {
        if self.remaining_block_space > 0 {
            let padding = vec![0u8; self.remaining_block_space as usize];
            self.file
                .write_all(&padding)
                .map_err(|e| MetaError::io_error(&self.file_path, e))?;
        }
        self.file_write_pos += self.remaining_block_space;
        self.remaining_block_space = self.block_size;
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        self.write_padding()?;
        self.file
            .flush()
            .map_err(|e| MetaError::io_error(&self.file_path, e))?;
        self.written_nodes += 1;
        Ok(())
    }

    /// Flushes the final partial leaf block, then builds internal node
    /// levels bottom-up until a single root block remains.
    pub fn finish(mut self) -> Result<()> {
        if self.num_terms == 0 {
            self.file
                .flush()
                .map_err(|e| MetaError::io_error(&self.file_path, e))?;
            self.inverse.finish()?;
            return Ok(());
        }

        if self.remaining_block_space != self.block_size {
            self.flush_block()?;
        }
        self.file
            .flush()
            .map_err(|e| MetaError::io_error(&self.file_path, e))?;
        self.inverse.finish()?;

        let mut remaining_nodes = self.written_nodes;
        self.written_nodes = 0;

        let reader_file =
            File::open(&self.file_path).map_err(|e| MetaError::io_error(&self.file_path, e))?;
        let mut reader = BufReader::new(reader_file);
        let mut read_pos: u64 = 0;

        // outer loop: one iteration per level built; stops once exactly one
        // node (the root) was written for the level just finished.
        while remaining_nodes != 1 {
            // inner loop: walk the level that was just written, one block
            // at a time, writing a head record for each into the new level.
            while remaining_nodes > 0 {
                let block_start = reader
                    .stream_position()
                    .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                let term = packed_io::read_cstr(&mut reader)
                    .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                packed_io::read_u64(&mut reader).map_err(|e| MetaError::io_error(&self.file_path, e))?;

                let mut head = Vec::new();
                packed_io::write_cstr(&mut head, &term)
                    .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                packed_io::write_u64(&mut head, read_pos)
                    .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                let head_len = head.len() as u64;

                if head_len > self.remaining_block_space {
                    self.flush_block()?;
                    // re-read this same block's head record next iteration
                    reader
                        .seek(SeekFrom::Start(block_start))
                        .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                } else {
                    self.file
                        .write_all(&head)
                        .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                    self.remaining_block_space -= head_len;

                    read_pos += self.block_size;
                    reader
                        .seek(SeekFrom::Start(block_start + self.block_size))
                        .map_err(|e| MetaError::io_error(&self.file_path, e))?;
                    remaining_nodes -= 1;
                }
            }

            if self.remaining_block_space != self.block_size {
                self.flush_block()?;
            }
            remaining_nodes = self.written_nodes;
            self.written_nodes = 0;
        }

        self.file
            .flush()
            .map_err(|e| MetaError::io_error(&self.file_path, e))?;
        Ok(())
    }
}

/// A read-only, `mmap`-backed view of the tree written by
/// [`VocabularyMapWriter`].
pub struct VocabularyMap {
    file: MmapFile,
    inverse: DiskVector<u64>,
    block_size: u64,
    leaf_end_pos: u64,
    initial_seek_pos: u64,
}

impl VocabularyMap {
    pub fn open(path: impl AsRef<Path>, block_size: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = MmapFile::open(path)?;
        let inverse = DiskVector::<u64>::open(inverse_path(path))?;

        let bytes = file.as_slice();

        let last_pos = inverse.at(inverse.len() - 1);
        let mut cursor = SliceCursor::new(&bytes[last_pos as usize..]);
        cursor
            .read_cstr()
            .map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        packed_io::read_u64(&mut cursor).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        // mirrors the source's `leaf_end_pos_` computation exactly,
        // including its off-by-one against the true end of the last
        // record (it omits the NUL terminator byte from the count).
        let leaf_end_pos = last_pos + cursor.position() as u64 - 1;

        let root_start = file.size() - block_size;
        let mut root_cursor = SliceCursor::new(&bytes[root_start as usize..]);
        root_cursor
            .read_cstr()
            .map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        let initial_seek_pos =
            packed_io::read_u64(&mut root_cursor).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;

        Ok(VocabularyMap {
            file,
            inverse,
            block_size,
            leaf_end_pos,
            initial_seek_pos,
        })
    }

    /// Looks up `term`, returning its id if present.
    pub fn find(&self, term: &str) -> Option<TermId> {
        let bytes = self.file.as_slice();
        let mut pos = self.file.size() - self.block_size;
        let mut seek_pos = self.initial_seek_pos;

        while pos > self.leaf_end_pos {
            let end_pos = pos + self.block_size;
            while pos < end_pos && bytes[pos as usize] != 0 {
                let mut cursor = SliceCursor::new(&bytes[pos as usize..]);
                let head_term = cursor.read_cstr().ok()?;
                if term < head_term.as_str() {
                    // stale seek_pos: the first term in this block already
                    // exceeds the target, so it cannot appear in the tree.
                    if seek_pos >= pos {
                        return None;
                    }
                    break;
                }
                let child_offset = packed_io::read_u64(&mut cursor).ok()?;
                seek_pos = child_offset;
                pos += cursor.position() as u64;
            }
            pos = seek_pos; // descends towards the leaves
        }

        let end_pos = pos + self.block_size;
        while pos < end_pos {
            let mut cursor = SliceCursor::new(&bytes[pos as usize..]);
            let head_term = cursor.read_cstr().ok()?;
            let matched = term == head_term;
            let term_id = packed_io::read_u64(&mut cursor).ok()?;
            if matched {
                return Some(TermId::new(term_id));
            }
            pos += cursor.position() as u64;
        }
        None
    }

    /// Finds the term for `t_id`. No bounds checking: ids beyond
    /// `size()` are undefined (mirroring the source's documented
    /// contract).
    pub fn find_term(&self, t_id: TermId) -> String {
        let offset = self.inverse.at(t_id.get() as usize);
        let bytes = self.file.as_slice();
        let mut cursor = SliceCursor::new(&bytes[offset as usize..]);
        cursor.read_cstr().expect("vocabulary map record corrupt")
    }

    pub fn size(&self) -> u64 {
        self.inverse.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_terms_across_multiple_blocks_and_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab");
        let terms = [
            "apple",
            "banana",
            "cherry",
            "date",
            "elderberry",
            "fig",
            "grape",
            "honeydew",
            "kiwi",
            "lemon",
            "mango",
            "nectarine",
        ];
        let block_size = 32;

        let mut writer = VocabularyMapWriter::create(&path, block_size).unwrap();
        for term in &terms {
            writer.insert(term).unwrap();
        }
        writer.finish().unwrap();

        let map = VocabularyMap::open(&path, block_size).unwrap();
        assert_eq!(map.size(), terms.len() as u64);
        for (idx, term) in terms.iter().enumerate() {
            let id = map.find(term).unwrap_or_else(|| panic!("missing term {term}"));
            assert_eq!(id.get(), idx as u64);
            assert_eq!(map.find_term(id), *term);
        }
        assert!(map.find("notaterm").is_none());
        assert!(map.find("zzzz").is_none());
        assert!(map.find("aaa").is_none());
    }

    #[test]
    fn single_block_vocabulary_needs_no_promotion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab");
        let block_size = 4096;

        let mut writer = VocabularyMapWriter::create(&path, block_size).unwrap();
        writer.insert("alpha").unwrap();
        writer.insert("beta").unwrap();
        writer.finish().unwrap();

        let map = VocabularyMap::open(&path, block_size).unwrap();
        assert_eq!(map.find("alpha").unwrap().get(), 0);
        assert_eq!(map.find("beta").unwrap().get(), 1);
    }

    #[test]
    fn rejects_empty_term() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab");
        let mut writer = VocabularyMapWriter::create(&path, 64).unwrap();
        assert!(writer.insert("").is_err());
    }

    fn check_a_to_n_vocabulary(block_size: u64) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab");
        let terms = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
        ];

        let mut writer = VocabularyMapWriter::create(&path, block_size).unwrap();
        for term in &terms {
            writer.insert(term).unwrap();
        }
        writer.finish().unwrap();

        let map = VocabularyMap::open(&path, block_size).unwrap();
        assert_eq!(map.size(), 14);
        assert_eq!(map.find("a"), Some(TermId::new(0)));
        assert_eq!(map.find("n"), Some(TermId::new(13)));
        assert_eq!(map.find("z"), None);
        assert_eq!(map.find_term(TermId::new(7)), "h");
    }

    #[test]
    fn a_to_n_vocabulary_at_block_size_20() {
        check_a_to_n_vocabulary(20);
    }

    #[test]
    fn a_to_n_vocabulary_at_block_size_23() {
        check_a_to_n_vocabulary(23);
    }
}
