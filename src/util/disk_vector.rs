//! mmap-backed fixed-record array with bounds-checked indexing.
//!
//! On-disk format: raw little-endian `T` values laid out sequentially, no
//! header; size is inferred from file length / `size_of::<T>()`. Used for
//! every `id -> offset`-shaped table in the on-disk layout (`byte_locations`,
//! the vocabulary map's inverse file, `metadata.index`, `docs.sizes`, ...).

use bytemuck::Pod;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::util::mmap_file::MmapFile;

/// Read-only mmapped view of a disk_vector file.
pub struct DiskVector<T: Pod> {
    file: MmapFile,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> DiskVector<T> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = MmapFile::open(path)?;
        let elem_size = std::mem::size_of::<T>();
        let len = file.as_slice().len() / elem_size;
        Ok(DiskVector {
            file,
            len,
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the value at `index`. Panics if `index >= len()`, matching the
    /// source's unchecked-access contract made memory-safe.
    pub fn at(&self, index: usize) -> T {
        let elem_size = std::mem::size_of::<T>();
        let start = index * elem_size;
        let bytes = &self.file.as_slice()[start..start + elem_size];
        bytemuck::pod_read_unaligned(bytes)
    }
}

/// Sequential writer for a disk_vector file. Values are appended in index
/// order; the writer does not support random-access writes because the
/// construction driver always produces these in ascending key order.
pub struct DiskVectorWriter<T: Pod> {
    path: PathBuf,
    writer: BufWriter<File>,
    count: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> DiskVectorWriter<T> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| MetaError::io_error(&path, e))?;
        Ok(DiskVectorWriter {
            path,
            writer: BufWriter::new(file),
            count: 0,
            _marker: PhantomData,
        })
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        let bytes = bytemuck::bytes_of(&value);
        self.writer
            .write_all(bytes)
            .map_err(|e| MetaError::io_error(&self.path, e))?;
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| MetaError::io_error(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_u64() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vec.bin");
        let mut writer = DiskVectorWriter::<u64>::create(&path).unwrap();
        for v in [10u64, 20, 30, 40] {
            writer.push(v).unwrap();
        }
        writer.finish().unwrap();

        let reader = DiskVector::<u64>::open(&path).unwrap();
        assert_eq!(reader.len(), 4);
        assert_eq!(reader.at(0), 10);
        assert_eq!(reader.at(3), 40);
    }
}
