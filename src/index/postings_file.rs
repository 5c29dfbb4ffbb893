//! The on-disk postings file: a flat stream of packed `PostingsData` records
//! indexed by a `disk_vector<u64>` of byte offsets, one per primary key.
//!
//! Grounded on `include/meta/index/postings_file.h` (reader: `mmap_file` +
//! `disk_vector<uint64_t> byte_locations_`, `find_stream` bounds-checks
//! against `byte_locations_.size()`) and `include/index/postings_file_writer.h`
//! (writer: sequential `write()` records the current byte position into
//! `byte_locations_[id_]` before appending, then increments `id_`).

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::index::postings_data::PostingsData;
use crate::index::postings_stream::PostingsStream;
use crate::packed_io::PackedValue;
use crate::types::GapKey;
use crate::util::disk_vector::{DiskVector, DiskVectorWriter};
use crate::util::mmap_file::MmapFile;

fn index_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(OsString::from("_index"));
    PathBuf::from(name)
}

/// Sequential writer: primary keys must be written in ascending id order
/// (the construction driver always does, since ids are assigned
/// sequentially by the vocabulary map / doc_id counter).
pub struct PostingsFileWriter<S, V> {
    output: BufWriter<File>,
    output_path: PathBuf,
    byte_locations: DiskVectorWriter<u64>,
    byte_pos: u64,
    _marker: PhantomData<(S, V)>,
}

impl<S: GapKey, V: PackedValue + Default + AddAssign> PostingsFileWriter<S, V> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let output = File::create(&path).map_err(|e| MetaError::io_error(&path, e))?;
        let byte_locations = DiskVectorWriter::<u64>::create(index_path(&path))?;
        Ok(PostingsFileWriter {
            output: BufWriter::new(output),
            output_path: path,
            byte_locations,
            byte_pos: 0,
            _marker: PhantomData,
        })
    }

    pub fn write(&mut self, pdata: &PostingsData<S, V>) -> Result<()> {
        self.byte_locations.push(self.byte_pos)?;
        let written = pdata
            .write_packed(&mut self.output)
            .map_err(|e| MetaError::io_error(&self.output_path, e))?;
        self.byte_pos += written;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.output
            .flush()
            .map_err(|e| MetaError::io_error(&self.output_path, e))?;
        self.byte_locations.finish()?;
        Ok(())
    }
}

/// `mmap`-backed reader over a completed postings file.
pub struct PostingsFile<S, V> {
    file: MmapFile,
    byte_locations: DiskVector<u64>,
    _marker: PhantomData<(S, V)>,
}

impl<S: GapKey, V: PackedValue> PostingsFile<S, V> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = MmapFile::open(path)?;
        let byte_locations = DiskVector::<u64>::open(index_path(path))?;
        Ok(PostingsFile {
            file,
            byte_locations,
            _marker: PhantomData,
        })
    }

    /// Obtains a lazily-decoded stream for `primary_key`'s postings, if
    /// `primary_key` is within range.
    pub fn find_stream(&self, primary_key: u64) -> Option<PostingsStream<'_, S, V>> {
        if primary_key >= self.byte_locations.len() as u64 {
            return None;
        }
        let offset = self.byte_locations.at(primary_key as usize);
        PostingsStream::new(&self.file.as_slice()[offset as usize..]).ok()
    }

    /// Materializes `primary_key`'s postings into a `PostingsData` map.
    pub fn find(&self, primary_key: u64) -> Option<PostingsData<S, V>>
    where
        V: Default + AddAssign,
    {
        let stream = self.find_stream(primary_key)?;
        let mut pdata = PostingsData::new();
        for (key, value) in stream.iter() {
            pdata.increase_count(key, value);
        }
        Some(pdata)
    }

    pub fn num_primary_keys(&self) -> u64 {
        self.byte_locations.len() as u64
    }
}
