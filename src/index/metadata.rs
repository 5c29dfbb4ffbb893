//! Per-document metadata storage: a schema-typed, lazily-decoded record
//! store (`metadata.db` + `metadata.index`).
//!
//! Grounded on `include/index/metadata.h` (the `get<T>` loop: search
//! already-decoded fields first, then decode forward through the schema
//! one field at a time until the target name is found or the schema is
//! exhausted) and `src/index/metadata_writer.cpp` (the on-disk header:
//! `packed_u64(schema.len() + 4)` followed by the four mandatory
//! `length`/`unique-terms`/`name`/`path` field descriptors, then the user
//! schema's; each document record is `packed_u64(length)`
//! `packed_u64(unique_terms)` a NUL-terminated `name` and `path`, then the
//! schema-typed fields in order). `name`/`path` ride along as mandatory
//! fields rather than a separate on-disk file so the layout in §6 stays
//! exactly as enumerated there.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::packed_io::{self, SliceCursor};
use crate::types::{DocId, MetadataFieldType, MetadataValue};
use crate::util::disk_vector::{DiskVector, DiskVectorWriter};
use crate::util::mmap_file::MmapFile;

pub type MetadataSchema = Vec<(String, MetadataFieldType)>;

fn field_type_tag(ty: MetadataFieldType) -> u64 {
    match ty {
        MetadataFieldType::SignedInt => 0,
        MetadataFieldType::UnsignedInt => 1,
        MetadataFieldType::Double => 2,
        MetadataFieldType::String => 3,
    }
}

fn field_type_name(ty: MetadataFieldType) -> &'static str {
    match ty {
        MetadataFieldType::SignedInt => "signed int",
        MetadataFieldType::UnsignedInt => "unsigned int",
        MetadataFieldType::Double => "double",
        MetadataFieldType::String => "string",
    }
}

/// Sequential writer: documents must be written in ascending `DocId` order
/// (matching the construction driver's per-doc sequential assignment).
pub struct MetadataWriter {
    db: BufWriter<File>,
    db_path: PathBuf,
    seek_pos: DiskVectorWriter<u64>,
    byte_pos: u64,
    schema: MetadataSchema,
}

impl MetadataWriter {
    pub fn create(prefix: impl AsRef<Path>, num_docs: u64, schema: MetadataSchema) -> Result<Self> {
        let prefix = prefix.as_ref();
        let db_path = prefix.join("metadata.db");
        let index_path = prefix.join("metadata.index");

        let mut db = BufWriter::new(File::create(&db_path).map_err(|e| MetaError::io_error(&db_path, e))?);
        let seek_pos = DiskVectorWriter::<u64>::create(&index_path)?;
        let _ = num_docs; // disk_vector writer grows as entries are pushed

        let mut byte_pos = packed_io::write_u64(&mut db, schema.len() as u64 + 4)
            .map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_cstr(&mut db, "length").map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_u64(&mut db, field_type_tag(MetadataFieldType::UnsignedInt))
            .map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos +=
            packed_io::write_cstr(&mut db, "unique-terms").map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_u64(&mut db, field_type_tag(MetadataFieldType::UnsignedInt))
            .map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_cstr(&mut db, "name").map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_u64(&mut db, field_type_tag(MetadataFieldType::String))
            .map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_cstr(&mut db, "path").map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        byte_pos += packed_io::write_u64(&mut db, field_type_tag(MetadataFieldType::String))
            .map_err(|e| MetaError::io_error(&db_path, e))? as u64;
        for (name, ty) in &schema {
            byte_pos += packed_io::write_cstr(&mut db, name).map_err(|e| MetaError::io_error(&db_path, e))? as u64;
            byte_pos +=
                packed_io::write_u64(&mut db, field_type_tag(*ty)).map_err(|e| MetaError::io_error(&db_path, e))?
                    as u64;
        }

        Ok(MetadataWriter {
            db,
            db_path,
            seek_pos,
            byte_pos,
            schema,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &mut self,
        _d_id: DocId,
        length: u64,
        unique_terms: u64,
        name: &str,
        path: &str,
        values: &[MetadataValue],
    ) -> Result<()> {
        if values.len() != self.schema.len() {
            return Err(MetaError::IndexFormat(
                "schema mismatch when writing metadata".to_owned(),
            ));
        }

        self.seek_pos.push(self.byte_pos)?;
        self.byte_pos +=
            packed_io::write_u64(&mut self.db, length).map_err(|e| MetaError::io_error(&self.db_path, e))? as u64;
        self.byte_pos += packed_io::write_u64(&mut self.db, unique_terms)
            .map_err(|e| MetaError::io_error(&self.db_path, e))? as u64;
        self.byte_pos +=
            packed_io::write_cstr(&mut self.db, name).map_err(|e| MetaError::io_error(&self.db_path, e))? as u64;
        self.byte_pos +=
            packed_io::write_cstr(&mut self.db, path).map_err(|e| MetaError::io_error(&self.db_path, e))? as u64;

        for (value, (name, ty)) in values.iter().zip(&self.schema) {
            if value.field_type() != *ty {
                return Err(MetaError::TypeMismatch {
                    field: name.clone(),
                    expected: field_type_name(*ty),
                });
            }
            self.byte_pos += (match value {
                MetadataValue::SignedInt(v) => packed_io::write_i64(&mut self.db, *v),
                MetadataValue::UnsignedInt(v) => packed_io::write_u64(&mut self.db, *v),
                MetadataValue::Double(v) => packed_io::write_f64(&mut self.db, *v),
                MetadataValue::String(v) => packed_io::write_cstr(&mut self.db, v),
            }
            .map_err(|e| MetaError::io_error(&self.db_path, e))?) as u64;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.db.flush().map_err(|e| MetaError::io_error(&self.db_path, e))?;
        self.seek_pos.finish()?;
        Ok(())
    }
}

/// A single document's decoded (so far) metadata record. Fields are decoded
/// lazily and cached, since the underlying stream is sequential and can
/// only move forward.
pub struct Metadata<'a> {
    schema: &'a MetadataSchema,
    cursor: SliceCursor<'a>,
    length: u64,
    unique_terms: u64,
    name: String,
    path: String,
    cached: Vec<Option<MetadataValue>>,
}

impl<'a> Metadata<'a> {
    pub fn new(bytes: &'a [u8], schema: &'a MetadataSchema) -> Result<Self> {
        let mut cursor = SliceCursor::new(bytes);
        let length = packed_io::read_u64(&mut cursor).map_err(MetaError::from)?;
        let unique_terms = packed_io::read_u64(&mut cursor).map_err(MetaError::from)?;
        let name = cursor.read_cstr().map_err(MetaError::from)?;
        let path = cursor.read_cstr().map_err(MetaError::from)?;
        Ok(Metadata {
            schema,
            cursor,
            length,
            unique_terms,
            name,
            path,
            cached: vec![None; schema.len()],
        })
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn unique_terms(&self) -> u64 {
        self.unique_terms
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decodes (if needed) and returns the named field.
    pub fn get(&mut self, name: &str) -> Result<&MetadataValue> {
        let idx = self
            .schema
            .iter()
            .position(|(field_name, _)| field_name == name)
            .ok_or_else(|| MetaError::UnknownField(name.to_owned()))?;

        for i in 0..=idx {
            if self.cached[i].is_some() {
                continue;
            }
            let (_, ty) = &self.schema[i];
            let value = match ty {
                MetadataFieldType::SignedInt => {
                    MetadataValue::SignedInt(packed_io::read_i64(&mut self.cursor).map_err(MetaError::from)?)
                }
                MetadataFieldType::UnsignedInt => {
                    MetadataValue::UnsignedInt(packed_io::read_u64(&mut self.cursor).map_err(MetaError::from)?)
                }
                MetadataFieldType::Double => {
                    MetadataValue::Double(packed_io::read_f64(&mut self.cursor).map_err(MetaError::from)?)
                }
                MetadataFieldType::String => MetadataValue::String(
                    self.cursor.read_cstr().map_err(MetaError::from)?,
                ),
            };
            self.cached[i] = Some(value);
        }
        Ok(self.cached[idx].as_ref().expect("just decoded"))
    }

    pub fn get_u64(&mut self, name: &str) -> Result<u64> {
        self.get(name)?
            .as_u64()
            .ok_or_else(|| MetaError::TypeMismatch {
                field: name.to_owned(),
                expected: "unsigned int",
            })
    }

    pub fn get_i64(&mut self, name: &str) -> Result<i64> {
        self.get(name)?
            .as_i64()
            .ok_or_else(|| MetaError::TypeMismatch {
                field: name.to_owned(),
                expected: "signed int",
            })
    }

    pub fn get_f64(&mut self, name: &str) -> Result<f64> {
        self.get(name)?
            .as_f64()
            .ok_or_else(|| MetaError::TypeMismatch {
                field: name.to_owned(),
                expected: "double",
            })
    }

    pub fn get_str(&mut self, name: &str) -> Result<&str> {
        let field = name.to_owned();
        self.get(name)?
            .as_str()
            .ok_or(MetaError::TypeMismatch {
                field,
                expected: "string",
            })
    }
}

/// The full `metadata.db` / `metadata.index` pair for a built index.
pub struct MetadataStore {
    file: MmapFile,
    seek_pos: DiskVector<u64>,
    schema: MetadataSchema,
}

impl MetadataStore {
    pub fn open(prefix: impl AsRef<Path>, schema: MetadataSchema) -> Result<Self> {
        let prefix = prefix.as_ref();
        let file = MmapFile::open(prefix.join("metadata.db"))?;
        let seek_pos = DiskVector::<u64>::open(prefix.join("metadata.index"))?;
        Ok(MetadataStore { file, seek_pos, schema })
    }

    pub fn get(&self, d_id: DocId) -> Result<Metadata<'_>> {
        let offset = self.seek_pos.at(d_id.get() as usize);
        Metadata::new(&self.file.as_slice()[offset as usize..], &self.schema)
    }

    pub fn num_docs(&self) -> u64 {
        self.seek_pos.len() as u64
    }

    pub fn schema(&self) -> &MetadataSchema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> MetadataSchema {
        vec![
            ("rating".to_owned(), MetadataFieldType::Double),
            ("title".to_owned(), MetadataFieldType::String),
        ]
    }

    #[test]
    fn writes_and_reads_back_typed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = MetadataWriter::create(dir.path(), 2, schema()).unwrap();
        writer
            .write(
                DocId::new(0),
                42,
                10,
                "doc-0.txt",
                "/corpus/doc-0.txt",
                &[
                    MetadataValue::Double(4.5),
                    MetadataValue::String("hello world".to_owned()),
                ],
            )
            .unwrap();
        writer
            .write(
                DocId::new(1),
                7,
                3,
                "doc-1.txt",
                "/corpus/doc-1.txt",
                &[
                    MetadataValue::Double(2.0),
                    MetadataValue::String("second doc".to_owned()),
                ],
            )
            .unwrap();
        writer.finish().unwrap();

        let store = MetadataStore::open(dir.path(), schema()).unwrap();
        assert_eq!(store.num_docs(), 2);

        let m0 = store.get(DocId::new(0)).unwrap();
        assert_eq!(m0.length(), 42);
        assert_eq!(m0.unique_terms(), 10);
        assert_eq!(m0.name(), "doc-0.txt");
        assert_eq!(m0.path(), "/corpus/doc-0.txt");
        let mut m0 = m0;
        assert_eq!(m0.get_f64("rating").unwrap(), 4.5);
        assert_eq!(m0.get_str("title").unwrap(), "hello world");

        let mut m1 = store.get(DocId::new(1)).unwrap();
        assert_eq!(m1.get_str("title").unwrap(), "second doc");
        assert_eq!(m1.get_f64("rating").unwrap(), 2.0);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = MetadataWriter::create(dir.path(), 1, schema()).unwrap();
        writer
            .write(
                DocId::new(0),
                1,
                1,
                "x.txt",
                "/x.txt",
                &[
                    MetadataValue::Double(1.0),
                    MetadataValue::String("x".to_owned()),
                ],
            )
            .unwrap();
        writer.finish().unwrap();

        let store = MetadataStore::open(dir.path(), schema()).unwrap();
        let mut m0 = store.get(DocId::new(0)).unwrap();
        assert!(m0.get("nonexistent").is_err());
    }

    #[test]
    fn type_mismatch_on_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = MetadataWriter::create(dir.path(), 1, schema()).unwrap();
        let result = writer.write(
            DocId::new(0),
            1,
            1,
            "x.txt",
            "/x.txt",
            &[
                MetadataValue::String("wrong type".to_owned()),
                MetadataValue::String("title".to_owned()),
            ],
        );
        assert!(result.is_err());
    }
}
