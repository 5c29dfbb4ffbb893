//! A flat file of NUL-terminated strings with a random-access index.
//!
//! Grounded on `include/index/string_list_writer.h`: a mutex-guarded,
//! pre-sized writer whose `insert(idx, elem)` records the current write
//! position into an index slot `idx`, independent of the order `insert` is
//! actually called in -- a caller may assign keys up front but discover
//! their values in whatever order its own source streams them. Since this
//! crate's `DiskVectorWriter` is append-only (writers elsewhere in this
//! crate never need random-access writes), the index here is staged in
//! memory and flushed to a `disk_vector` only at `finish()`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{MetaError, Result};
use crate::packed_io::{self, SliceCursor};
use crate::util::disk_vector::{DiskVector, DiskVectorWriter};
use crate::util::mmap_file::MmapFile;

fn index_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(std::ffi::OsString::from(".index"));
    PathBuf::from(name)
}

struct Inner {
    file: BufWriter<File>,
    file_path: PathBuf,
    write_pos: u64,
    offsets: Vec<u64>,
}

/// Thread-safe writer: `insert` may be called concurrently from multiple
/// workers, each assigned a disjoint set of `idx` slots.
pub struct StringListWriter {
    inner: Mutex<Inner>,
    index_path: PathBuf,
}

impl StringListWriter {
    pub fn create(path: impl AsRef<Path>, size: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| MetaError::io_error(&path, e))?;
        let index_path = index_path(&path);
        Ok(StringListWriter {
            inner: Mutex::new(Inner {
                file: BufWriter::new(file),
                file_path: path,
                write_pos: 0,
                offsets: vec![0u64; size as usize],
            }),
            index_path,
        })
    }

    pub fn insert(&self, idx: u64, elem: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("string list writer mutex poisoned");
        let pos = inner.write_pos;
        inner.offsets[idx as usize] = pos;
        let written = packed_io::write_cstr(&mut inner.file, elem)
            .map_err(|e| MetaError::io_error(&inner.file_path, e))?;
        inner.write_pos += written as u64;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        let mut inner = self.inner.into_inner().expect("string list writer mutex poisoned");
        inner
            .file
            .flush()
            .map_err(|e| MetaError::io_error(&inner.file_path, e))?;

        let mut index_writer = DiskVectorWriter::<u64>::create(&self.index_path)?;
        for offset in inner.offsets {
            index_writer.push(offset)?;
        }
        index_writer.finish()?;
        Ok(())
    }
}

/// `mmap`-backed reader over a completed string list.
pub struct StringList {
    file: MmapFile,
    index: DiskVector<u64>,
}

impl StringList {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = MmapFile::open(path)?;
        let index = DiskVector::<u64>::open(index_path(path))?;
        Ok(StringList { file, index })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Reads the string at `idx`. Panics if `idx` is out of range or the
    /// record is corrupt, matching the other disk-resident readers'
    /// unchecked-access contract.
    pub fn get(&self, idx: u64) -> String {
        let offset = self.index.at(idx as usize);
        let mut cursor = SliceCursor::new(&self.file.as_slice()[offset as usize..]);
        cursor.read_cstr().expect("corrupt string_list record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_back_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.names");

        let writer = StringListWriter::create(&path, 3).unwrap();
        // insert out of doc-id order, as parallel workers would
        writer.insert(2, "third.txt").unwrap();
        writer.insert(0, "first.txt").unwrap();
        writer.insert(1, "second.txt").unwrap();
        writer.finish().unwrap();

        let list = StringList::open(&path).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0), "first.txt");
        assert_eq!(list.get(1), "second.txt");
        assert_eq!(list.get(2), "third.txt");
    }

    #[test]
    fn empty_list_has_zero_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.paths");
        let writer = StringListWriter::create(&path, 0).unwrap();
        writer.finish().unwrap();

        let list = StringList::open(&path).unwrap();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn reads_every_key_back_out_of_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.bin");

        let entries: [(u64, &str); 6] = [
            (5, "wat woah this is neato"),
            (0, "things and stuff"),
            (2, "other stuff"),
            (1, "cat"),
            (4, "dog"),
            (3, "a no good very dead ex-parrot"),
        ];
        let writer = StringListWriter::create(&path, 6).unwrap();
        for (idx, elem) in &entries {
            writer.insert(*idx, elem).unwrap();
        }
        writer.finish().unwrap();

        let list = StringList::open(&path).unwrap();
        assert_eq!(list.get(5), "wat woah this is neato");
        assert_eq!(list.get(3), "a no good very dead ex-parrot");
        for (idx, elem) in &entries {
            assert_eq!(list.get(*idx), *elem);
        }
    }
}
