//! RAII wrapper around a read-only memory map.
//!
//! Grounded on `meta::io::mmap_file` (constructor opens and maps a file
//! read-only; destructor un-maps), implemented here on top of `memmap2` for
//! mmapped postings and doc-length access.

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};

/// A read-only memory-mapped file. Readers of a built index share this
/// freely; it is immutable for the lifetime of the mapping.
pub struct MmapFile {
    path: PathBuf,
    mmap: Mmap,
}

impl MmapFile {
    /// Opens and memory-maps `path` read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| MetaError::io_error(&path, e))?;
        // SAFETY: the file is not expected to be mutated concurrently;
        // indexes are built once and treated as read-only thereafter.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| MetaError::io_error(&path, e))?;
        Ok(MmapFile { path, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Byte at `index`; panics if out of bounds, matching the source's
    /// documented undefined-behavior-on-out-of-bounds contract made safe.
    pub fn get(&self, index: u64) -> u8 {
        self.mmap[index as usize]
    }
}
