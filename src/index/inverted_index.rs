//! Term-keyed disk index: `term_id -> (doc_id -> count)` postings, built by
//! tokenizing a corpus and merging external-memory chunks (§4.12).
//!
//! Grounded on `include/meta/index/inverted_index.h` (the public surface:
//! `tokenize`, `search_primary`, `stream_for`, `doc_freq`, `term_freq`,
//! `total_corpus_terms`, `total_num_occurences`, `avg_doc_length`) and on
//! the construction driver sketched in `src/index/forward_index.cpp`'s
//! older `tokenize_docs` (tokenize, assign doc_id, buffer postings, flush a
//! chunk every so often) generalized to the `ChunkHandler`/`vocabulary_map`
//! two-pass scheme §4.3-4.5 actually specify.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use crate::analyzer::Analyzer;
use crate::corpus::Corpus;
use crate::error::{MetaError, Result};
use crate::index::chunk::{merge_chunks, read_merged_chunk, ChunkHandler};
use crate::index::disk_index::{self, DiskIndex, DiskIndexBase};
use crate::index::metadata::{MetadataSchema, MetadataWriter};
use crate::index::postings_data::PostingsData;
use crate::index::postings_file::{PostingsFile, PostingsFileWriter};
use crate::index::postings_stream::PostingsStream;
use crate::index::vocabulary_map::{VocabularyMapWriter, DEFAULT_BLOCK_SIZE};
use crate::types::{ClassLabel, DocId, FeatureMap, LabelId, TermId};
use crate::util::disk_vector::DiskVectorWriter;

const POSTINGS_FILE: &str = "postings.bin";

pub struct InvertedIndex {
    base: DiskIndexBase,
    postings: PostingsFile<DocId, u64>,
    analyzer: Mutex<Box<dyn Analyzer>>,
    total_corpus_terms: OnceLock<u64>,
    avg_doc_length: OnceLock<f64>,
}

impl InvertedIndex {
    /// Re-tokenizes `doc` with this index's analyzer -- used to turn an
    /// incoming query's text into a term -> count map comparable against
    /// the stored postings.
    pub fn tokenize(&self, doc: &crate::corpus::Document) -> Result<FeatureMap<String>> {
        self.analyzer.lock().expect("analyzer mutex poisoned").tokenize(doc)
    }

    pub fn search_primary(&self, t_id: TermId) -> Option<PostingsData<DocId, u64>> {
        self.postings.find(t_id.get())
    }

    pub fn stream_for(&self, t_id: TermId) -> Option<PostingsStream<'_, DocId, u64>> {
        self.postings.find_stream(t_id.get())
    }

    pub fn doc_freq(&self, t_id: TermId) -> u64 {
        self.stream_for(t_id).map(|s| s.size()).unwrap_or(0)
    }

    pub fn term_freq(&self, t_id: TermId, d_id: DocId) -> u64 {
        match self.stream_for(t_id) {
            Some(stream) => stream.iter().find(|(doc, _)| *doc == d_id).map(|(_, count)| count).unwrap_or(0),
            None => 0,
        }
    }

    pub fn total_corpus_terms(&self) -> u64 {
        *self
            .total_corpus_terms
            .get_or_init(|| self.base.docs().iter().map(|&d| self.base.doc_size(d)).sum())
    }

    pub fn total_num_occurences(&self, t_id: TermId) -> u64 {
        self.search_primary(t_id).map(|pd| pd.total_counts()).unwrap_or(0)
    }

    pub fn avg_doc_length(&self) -> f64 {
        *self.avg_doc_length.get_or_init(|| {
            let n = self.base.num_docs();
            if n == 0 {
                0.0
            } else {
                self.total_corpus_terms() as f64 / n as f64
            }
        })
    }

    pub fn prefix(&self) -> &Path {
        self.base.prefix()
    }

    /// Opens a previously-built inverted index.
    pub fn load(
        prefix: impl AsRef<Path>,
        index_name: impl Into<String>,
        schema: MetadataSchema,
        analyzer: Box<dyn Analyzer>,
    ) -> Result<Self> {
        let prefix = prefix.as_ref();
        let base = DiskIndexBase::open(prefix, index_name, schema)?;
        let postings = PostingsFile::<DocId, u64>::open(prefix.join(POSTINGS_FILE))?;
        Ok(InvertedIndex {
            base,
            postings,
            analyzer: Mutex::new(analyzer),
            total_corpus_terms: OnceLock::new(),
            avg_doc_length: OnceLock::new(),
        })
    }

    /// Builds a fresh inverted index from `corpus`, following the
    /// construction driver of §4.12: tokenize each document, buffer its
    /// postings in a [`ChunkHandler`] keyed by term text, flush metadata
    /// and doc-level tables as documents stream by, then merge chunks and
    /// assign term ids via the vocabulary map in a single sorted pass.
    pub fn build<C: Corpus>(
        prefix: impl AsRef<Path>,
        index_name: impl Into<String>,
        mut corpus: C,
        mut analyzer: Box<dyn Analyzer>,
        max_buffer_docs: Option<u64>,
        max_buffer_bytes: Option<u64>,
    ) -> Result<Self> {
        let prefix = prefix.as_ref();
        let index_name = index_name.into();
        std::fs::create_dir_all(prefix).map_err(|e| MetaError::io_error(&prefix.to_path_buf(), e))?;

        let schema = corpus.schema();
        let num_docs = corpus.size();
        log::info!("building inverted index \"{}\" at {} ({} docs)", index_name, prefix.display(), num_docs);

        let mut metadata_writer = MetadataWriter::create(prefix, num_docs, schema.clone())?;
        let mut doc_sizes = DiskVectorWriter::<u64>::create(disk_index::doc_sizes_path(prefix))?;
        let mut doc_unique_terms = DiskVectorWriter::<u64>::create(disk_index::doc_unique_terms_path(prefix))?;
        let mut doc_labels = DiskVectorWriter::<u32>::create(disk_index::doc_labels_path(prefix))?;

        let chunk_dir = prefix.join("chunks");
        std::fs::create_dir_all(&chunk_dir).map_err(|e| MetaError::io_error(&chunk_dir, e))?;
        let mut handler: ChunkHandler<String, DocId, u64> =
            ChunkHandler::new(&chunk_dir, "inv", max_buffer_docs, max_buffer_bytes);

        let mut label_names: Vec<ClassLabel> = Vec::new();

        let mut docs_read: u64 = 0;
        while corpus.has_next() {
            let doc = corpus.next()?;
            let counts = analyzer.tokenize(&doc)?;
            let length: u64 = counts.values().sum();
            let unique = counts.len() as u64;

            for (term, count) in &counts {
                handler.increase_count(term.clone(), doc.doc_id, *count)?;
            }

            docs_read += 1;
            if docs_read % 100_000 == 0 {
                log::debug!("tokenized {docs_read} documents so far");
            }

            let label = doc.class_label.clone().unwrap_or_else(|| ClassLabel::from("[none]"));
            let label_id = match label_names.iter().position(|l| l == &label) {
                Some(idx) => idx as u32,
                None => {
                    label_names.push(label);
                    (label_names.len() - 1) as u32
                }
            };

            doc_sizes.push(length)?;
            doc_unique_terms.push(unique)?;
            doc_labels.push(label_id)?;

            let name = document_name(&doc);
            let path = document_path(&doc);
            let values: Vec<_> = doc.metadata.into_iter().map(|(_, v)| v).collect();
            metadata_writer.write(doc.doc_id, length, unique, &name, &path, &values)?;
        }

        doc_sizes.finish()?;
        doc_unique_terms.finish()?;
        doc_labels.finish()?;
        metadata_writer.finish()?;
        disk_index::write_label_names(&disk_index::label_names_path(prefix), &label_names)?;
        log::info!("read {docs_read} documents, wrote doc-level tables");

        let chunks = handler.finish()?;
        log::debug!("flushed {} postings chunk(s) to {}", chunks.len(), chunk_dir.display());
        let vocab_path = disk_index::vocab_path(prefix);
        let mut vocab_writer = VocabularyMapWriter::create(&vocab_path, DEFAULT_BLOCK_SIZE)?;
        let mut postings_writer = PostingsFileWriter::<DocId, u64>::create(prefix.join(POSTINGS_FILE))?;

        if !chunks.is_empty() {
            log::info!("merging {} chunk(s)", chunks.len());
            let merged = merge_chunks::<String, DocId, u64>(chunks, &chunk_dir, "inv")?;
            let records: Vec<(String, PostingsData<DocId, u64>)> = read_merged_chunk(&merged)?;
            log::debug!("building vocabulary map over {} distinct terms", records.len());
            for (term, pdata) in &records {
                vocab_writer.insert(term)?;
                postings_writer.write(pdata)?;
            }
        }
        vocab_writer.finish()?;
        postings_writer.finish()?;
        std::fs::remove_dir_all(&chunk_dir).ok();
        log::info!("finalized inverted index \"{}\" at {}", index_name, prefix.display());

        Self::load(prefix, index_name, schema, analyzer)
    }

    /// Loads `prefix` if it already holds a complete index, else builds
    /// one from `corpus` (the §4.7 construct-vs-reload branch).
    pub fn open_or_build<C: Corpus>(
        prefix: impl AsRef<Path>,
        index_name: impl Into<String>,
        schema: MetadataSchema,
        analyzer: Box<dyn Analyzer>,
        corpus: impl FnOnce() -> Result<C>,
        max_buffer_docs: Option<u64>,
        max_buffer_bytes: Option<u64>,
    ) -> Result<Self> {
        let prefix = prefix.as_ref();
        let index_name = index_name.into();
        if disk_index::shared_files_present(prefix) && prefix.join(POSTINGS_FILE).exists() {
            Self::load(prefix, index_name, schema, analyzer)
        } else {
            let corpus = corpus()?;
            Self::build(prefix, index_name, corpus, analyzer, max_buffer_docs, max_buffer_bytes)
        }
    }
}

fn document_name(doc: &crate::corpus::Document) -> String {
    match &doc.content {
        crate::corpus::DocContent::File(path) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("doc-{}", doc.doc_id.get())),
        crate::corpus::DocContent::Inline(_) => format!("doc-{}", doc.doc_id.get()),
    }
}

fn document_path(doc: &crate::corpus::Document) -> String {
    match &doc.content {
        crate::corpus::DocContent::File(path) => path.display().to_string(),
        crate::corpus::DocContent::Inline(_) => format!("doc-{}", doc.doc_id.get()),
    }
}

impl crate::caching::cached_index::PrimarySearch for InvertedIndex {
    type PrimaryKey = TermId;
    type SecondaryKey = DocId;
    type Value = u64;

    fn search_primary_uncached(&self, p_id: TermId) -> Option<PostingsData<DocId, u64>> {
        self.search_primary(p_id)
    }
}

impl DiskIndex for InvertedIndex {
    fn index_name(&self) -> &str {
        self.base.index_name()
    }

    fn num_docs(&self) -> u64 {
        self.base.num_docs()
    }

    fn doc_name(&self, d_id: DocId) -> String {
        self.base.doc_name(d_id)
    }

    fn doc_path(&self, d_id: DocId) -> String {
        self.base.doc_path(d_id)
    }

    fn docs(&self) -> Vec<DocId> {
        self.base.docs()
    }

    fn doc_size(&self, d_id: DocId) -> u64 {
        self.base.doc_size(d_id)
    }

    fn label(&self, d_id: DocId) -> ClassLabel {
        self.base.label(d_id)
    }

    fn lbl_id(&self, d_id: DocId) -> LabelId {
        self.base.lbl_id(d_id)
    }

    fn class_label_id(&self, label: &ClassLabel) -> Option<LabelId> {
        self.base.class_label_id(label)
    }

    fn class_label_from_id(&self, l_id: LabelId) -> ClassLabel {
        self.base.class_label_from_id(l_id)
    }

    fn num_labels(&self) -> u64 {
        self.base.num_labels()
    }

    fn class_labels(&self) -> Vec<ClassLabel> {
        self.base.class_labels()
    }

    fn metadata(&self, d_id: DocId) -> Result<crate::index::metadata::Metadata<'_>> {
        self.base.metadata(d_id)
    }

    fn unique_terms_for_doc(&self, d_id: DocId) -> u64 {
        self.base.unique_terms_for_doc(d_id)
    }

    fn unique_terms_total(&self) -> u64 {
        self.base.unique_terms_total()
    }

    fn get_term_id(&self, term: &str) -> Option<TermId> {
        self.base.get_term_id(term)
    }

    fn term_text(&self, t_id: TermId) -> String {
        self.base.term_text(t_id)
    }
}
