//! Shared on-disk index surface: the parts common to both the inverted and
//! forward index (doc metadata, class labels, the term vocabulary).
//!
//! Grounded on `include/meta/index/disk_index.h`'s pimpl base class, which
//! exposes exactly the accessors named in [`DiskIndex`] below and leaves
//! the primary-key-specific methods (`tokenize`, `search_primary`, ...) to
//! the two concrete subclasses.

use std::io::{BufReader, BufWriter};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::index::metadata::{Metadata, MetadataSchema, MetadataStore};
use crate::index::vocabulary_map::VocabularyMap;
use crate::packed_io;
use crate::types::{ClassLabel, DocId, LabelId, TermId};
use crate::util::disk_vector::DiskVector;

pub const VOCAB_FILE: &str = "vocab.bin";
pub const DOC_SIZES_FILE: &str = "docs.sizes";
pub const DOC_UNIQUE_TERMS_FILE: &str = "docs.unique_terms";
pub const DOC_LABELS_FILE: &str = "docs.labels";
pub const LABELIDS_MAPPING_FILE: &str = "labelids.mapping";

/// Accessors shared by [`InvertedIndex`](crate::index::InvertedIndex) and
/// [`ForwardIndex`](crate::index::ForwardIndex).
pub trait DiskIndex {
    fn index_name(&self) -> &str;
    fn num_docs(&self) -> u64;
    fn doc_name(&self, d_id: DocId) -> String;
    fn doc_path(&self, d_id: DocId) -> String;
    fn docs(&self) -> Vec<DocId>;
    fn doc_size(&self, d_id: DocId) -> u64;
    fn label(&self, d_id: DocId) -> ClassLabel;
    fn lbl_id(&self, d_id: DocId) -> LabelId;
    fn class_label_id(&self, label: &ClassLabel) -> Option<LabelId>;
    fn class_label_from_id(&self, l_id: LabelId) -> ClassLabel;
    fn num_labels(&self) -> u64;
    fn class_labels(&self) -> Vec<ClassLabel>;
    fn metadata(&self, d_id: DocId) -> Result<Metadata<'_>>;
    fn unique_terms_for_doc(&self, d_id: DocId) -> u64;
    fn unique_terms_total(&self) -> u64;
    fn get_term_id(&self, term: &str) -> Option<TermId>;
    fn term_text(&self, t_id: TermId) -> String;
}

/// The fields and logic every `disk_index` subclass shares. Concrete index
/// types embed one of these and implement [`DiskIndex`] by delegating to
/// its inherent methods.
pub struct DiskIndexBase {
    prefix: PathBuf,
    index_name: String,
    vocabulary: VocabularyMap,
    doc_sizes: DiskVector<u64>,
    doc_unique_terms: DiskVector<u64>,
    doc_labels: DiskVector<u32>,
    label_names: Vec<ClassLabel>,
    metadata: MetadataStore,
}

impl DiskIndexBase {
    pub fn open(prefix: impl AsRef<Path>, index_name: impl Into<String>, schema: MetadataSchema) -> Result<Self> {
        let prefix = prefix.as_ref();
        let vocabulary = VocabularyMap::open(
            prefix.join(VOCAB_FILE),
            crate::index::vocabulary_map::DEFAULT_BLOCK_SIZE,
        )?;
        let doc_sizes = DiskVector::<u64>::open(prefix.join(DOC_SIZES_FILE))?;
        let doc_unique_terms = DiskVector::<u64>::open(prefix.join(DOC_UNIQUE_TERMS_FILE))?;
        let doc_labels = DiskVector::<u32>::open(prefix.join(DOC_LABELS_FILE))?;
        let label_names = read_label_names(&prefix.join(LABELIDS_MAPPING_FILE))?;
        let metadata = MetadataStore::open(prefix, schema)?;

        Ok(DiskIndexBase {
            prefix: prefix.to_path_buf(),
            index_name: index_name.into(),
            vocabulary,
            doc_sizes,
            doc_unique_terms,
            doc_labels,
            label_names,
            metadata,
        })
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn num_docs(&self) -> u64 {
        self.doc_sizes.len() as u64
    }

    /// Reads `name`/`path` back out of the metadata store, where they are
    /// stored as the first two mandatory declared fields alongside
    /// `length`/`unique-terms` (§4.7's facade contract, without inventing a
    /// file the on-disk layout table doesn't list).
    pub fn doc_name(&self, d_id: DocId) -> String {
        self.metadata.get(d_id).expect("metadata record for doc_name").name().to_owned()
    }

    pub fn doc_path(&self, d_id: DocId) -> String {
        self.metadata.get(d_id).expect("metadata record for doc_path").path().to_owned()
    }

    pub fn docs(&self) -> Vec<DocId> {
        (0..self.num_docs()).map(DocId::new).collect()
    }

    pub fn doc_size(&self, d_id: DocId) -> u64 {
        self.doc_sizes.at(d_id.get() as usize)
    }

    pub fn label(&self, d_id: DocId) -> ClassLabel {
        self.class_label_from_id(LabelId::new(self.doc_labels.at(d_id.get() as usize)))
    }

    pub fn lbl_id(&self, d_id: DocId) -> LabelId {
        LabelId::new(self.doc_labels.at(d_id.get() as usize))
    }

    pub fn class_label_id(&self, label: &ClassLabel) -> Option<LabelId> {
        self.label_names
            .iter()
            .position(|l| l == label)
            .map(|idx| LabelId::new(idx as u32))
    }

    pub fn class_label_from_id(&self, l_id: LabelId) -> ClassLabel {
        self.label_names
            .get(l_id.get() as usize)
            .cloned()
            .unwrap_or_else(|| ClassLabel::from("[none]"))
    }

    pub fn num_labels(&self) -> u64 {
        self.label_names.len() as u64
    }

    pub fn class_labels(&self) -> Vec<ClassLabel> {
        self.label_names.clone()
    }

    pub fn metadata(&self, d_id: DocId) -> Result<Metadata<'_>> {
        self.metadata.get(d_id)
    }

    pub fn unique_terms_for_doc(&self, d_id: DocId) -> u64 {
        self.doc_unique_terms.at(d_id.get() as usize)
    }

    pub fn unique_terms_total(&self) -> u64 {
        self.vocabulary.size()
    }

    pub fn get_term_id(&self, term: &str) -> Option<TermId> {
        self.vocabulary.find(term)
    }

    pub fn term_text(&self, t_id: TermId) -> String {
        self.vocabulary.find_term(t_id)
    }
}

/// Reads `labelids.mapping`: a packed sequential list of
/// `(packed_u64(label_id), NUL-terminated class_label string)` records, no
/// tree structure needed since label cardinality is small. Loaded fully
/// into a `Vec<ClassLabel>` indexed by `label_id`.
fn read_label_names(path: &Path) -> Result<Vec<ClassLabel>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
    let mut reader = BufReader::new(file);
    let mut labels: Vec<ClassLabel> = Vec::new();
    loop {
        let label_id = match packed_io::read_u64(&mut reader) {
            Ok(id) => id,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(MetaError::io_error(&path.to_path_buf(), e)),
        };
        let text = packed_io::read_cstr(&mut reader).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        let idx = label_id as usize;
        if idx >= labels.len() {
            labels.resize(idx + 1, ClassLabel::from(""));
        }
        labels[idx] = ClassLabel::from(text);
    }
    Ok(labels)
}

pub fn write_label_names(path: &Path, labels: &[ClassLabel]) -> Result<()> {
    let file = File::create(path).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
    let mut writer = BufWriter::new(file);
    for (label_id, label) in labels.iter().enumerate() {
        packed_io::write_u64(&mut writer, label_id as u64).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        packed_io::write_cstr(&mut writer, &label.0).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
    }
    std::io::Write::flush(&mut writer).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))
}

/// Whether `prefix` contains a complete set of files for either index type
/// (the files shared by both `InvertedIndex` and `ForwardIndex`), mirroring
/// the source's `valid()` directory check used to decide construct-vs-reload.
pub fn shared_files_present(prefix: &Path) -> bool {
    [VOCAB_FILE, DOC_SIZES_FILE, DOC_UNIQUE_TERMS_FILE, DOC_LABELS_FILE]
        .iter()
        .all(|name| prefix.join(name).exists())
        && prefix.join("metadata.db").exists()
        && prefix.join("metadata.index").exists()
}

pub fn doc_sizes_path(prefix: &Path) -> PathBuf {
    prefix.join(DOC_SIZES_FILE)
}

pub fn doc_unique_terms_path(prefix: &Path) -> PathBuf {
    prefix.join(DOC_UNIQUE_TERMS_FILE)
}

pub fn doc_labels_path(prefix: &Path) -> PathBuf {
    prefix.join(DOC_LABELS_FILE)
}

pub fn vocab_path(prefix: &Path) -> PathBuf {
    prefix.join(VOCAB_FILE)
}

pub fn label_names_path(prefix: &Path) -> PathBuf {
    prefix.join(LABELIDS_MAPPING_FILE)
}

/// Copies the files shared between an inverted index and its corresponding
/// forward index (vocabulary, per-doc sizes/labels/metadata) from `src` to
/// `dst`, used when building a forward index as the transpose of an
/// already-built inverted index (§4.5's note that forward construction is
/// "the specified transpose", not a second from-scratch corpus pass).
pub fn copy_shared_files(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst).map_err(|e| MetaError::io_error(&dst.to_path_buf(), e))?;
    let names = [
        VOCAB_FILE.to_owned(),
        format!("{VOCAB_FILE}.inverse"),
        DOC_SIZES_FILE.to_owned(),
        DOC_UNIQUE_TERMS_FILE.to_owned(),
        DOC_LABELS_FILE.to_owned(),
        LABELIDS_MAPPING_FILE.to_owned(),
        "metadata.db".to_owned(),
        "metadata.index".to_owned(),
    ];
    for name in names {
        let from = src.join(&name);
        let to = dst.join(&name);
        std::fs::copy(&from, &to).map_err(|e| MetaError::io_error(&from, e))?;
    }
    Ok(())
}
