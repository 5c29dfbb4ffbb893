//! Document-keyed disk index: `doc_id -> (term_id -> count)` postings,
//! built as the transpose of a completed [`InvertedIndex`] rather than a
//! second from-scratch accumulation pass (§4.5's closing note).
//!
//! Grounded structurally on `src/index/forward_index.cpp`'s older
//! `tokenize_docs`/`write_chunk` shape (buffer `postings_data<doc_id,
//! term_id>` and flush periodically) adapted to read from the already-built
//! inverted index's postings instead of re-tokenizing the corpus.

use std::path::Path;

use crate::error::Result;
use crate::index::chunk::{merge_chunks, read_merged_chunk, ChunkHandler};
use crate::index::disk_index::{self, DiskIndex, DiskIndexBase};
use crate::index::inverted_index::InvertedIndex;
use crate::index::metadata::MetadataSchema;
use crate::index::postings_data::PostingsData;
use crate::index::postings_file::{PostingsFile, PostingsFileWriter};
use crate::index::postings_stream::PostingsStream;
use crate::types::{ClassLabel, DocId, LabelId, TermId};

const POSTINGS_FILE: &str = "postings.bin";

pub struct ForwardIndex {
    base: DiskIndexBase,
    postings: PostingsFile<TermId, u64>,
}

impl ForwardIndex {
    pub fn search_primary(&self, d_id: DocId) -> Option<PostingsData<TermId, u64>> {
        self.postings.find(d_id.get())
    }

    pub fn stream_for(&self, d_id: DocId) -> Option<PostingsStream<'_, TermId, u64>> {
        self.postings.find_stream(d_id.get())
    }

    pub fn prefix(&self) -> &Path {
        self.base.prefix()
    }

    pub fn load(prefix: impl AsRef<Path>, index_name: impl Into<String>, schema: MetadataSchema) -> Result<Self> {
        let prefix = prefix.as_ref();
        let base = DiskIndexBase::open(prefix, index_name, schema)?;
        let postings = PostingsFile::<TermId, u64>::open(prefix.join(POSTINGS_FILE))?;
        Ok(ForwardIndex { base, postings })
    }

    /// Builds a forward index at `prefix` by transposing `inv`'s postings:
    /// shared per-document tables (sizes, labels, metadata including
    /// name/path, vocabulary) are copied verbatim, and `postings.bin` is
    /// produced by streaming every term's postings list and regrouping by
    /// document.
    pub fn build(
        prefix: impl AsRef<Path>,
        index_name: impl Into<String>,
        inv: &InvertedIndex,
        schema: MetadataSchema,
        max_buffer_docs: Option<u64>,
        max_buffer_bytes: Option<u64>,
    ) -> Result<Self> {
        let prefix = prefix.as_ref();
        let index_name = index_name.into();
        log::info!("building forward index \"{}\" at {} by transposing {}", index_name, prefix.display(), inv.prefix().display());
        disk_index::copy_shared_files(inv.prefix(), prefix)?;

        let chunk_dir = prefix.join("chunks");
        std::fs::create_dir_all(&chunk_dir)
            .map_err(|e| crate::error::MetaError::io_error(&chunk_dir, e))?;
        let mut handler: ChunkHandler<DocId, TermId, u64> =
            ChunkHandler::new(&chunk_dir, "fwd", max_buffer_docs, max_buffer_bytes);

        let num_terms = inv.unique_terms_total();
        for t in 0..num_terms {
            let t_id = TermId::new(t);
            if let Some(stream) = inv.stream_for(t_id) {
                for (doc_id, count) in stream.iter() {
                    handler.increase_count(doc_id, t_id, count)?;
                }
            }
        }
        log::debug!("read postings for {num_terms} terms from the inverted index");

        let chunks = handler.finish()?;
        log::debug!("flushed {} transposed chunk(s) to {}", chunks.len(), chunk_dir.display());
        let mut postings_writer = PostingsFileWriter::<TermId, u64>::create(prefix.join(POSTINGS_FILE))?;
        let num_docs = inv.num_docs();

        if chunks.is_empty() {
            for _ in 0..num_docs {
                postings_writer.write(&PostingsData::new())?;
            }
        } else {
            log::info!("merging {} chunk(s)", chunks.len());
            let merged = merge_chunks::<DocId, TermId, u64>(chunks, &chunk_dir, "fwd")?;
            let records: Vec<(DocId, PostingsData<TermId, u64>)> = read_merged_chunk(&merged)?;
            let mut records = records.into_iter().peekable();

            for d in 0..num_docs {
                let pdata = match records.peek() {
                    Some((doc_id, _)) if doc_id.get() == d => records.next().unwrap().1,
                    _ => PostingsData::new(),
                };
                postings_writer.write(&pdata)?;
            }
        }
        postings_writer.finish()?;
        std::fs::remove_dir_all(&chunk_dir).ok();
        log::info!("finalized forward index \"{}\" at {}", index_name, prefix.display());

        Self::load(prefix, index_name, schema)
    }

    pub fn open_or_build(
        prefix: impl AsRef<Path>,
        index_name: impl Into<String>,
        inv: &InvertedIndex,
        schema: MetadataSchema,
        max_buffer_docs: Option<u64>,
        max_buffer_bytes: Option<u64>,
    ) -> Result<Self> {
        let prefix = prefix.as_ref();
        let index_name = index_name.into();
        if disk_index::shared_files_present(prefix) && prefix.join(POSTINGS_FILE).exists() {
            Self::load(prefix, index_name, schema)
        } else {
            Self::build(prefix, index_name, inv, schema, max_buffer_docs, max_buffer_bytes)
        }
    }
}

impl crate::caching::cached_index::PrimarySearch for ForwardIndex {
    type PrimaryKey = DocId;
    type SecondaryKey = TermId;
    type Value = u64;

    fn search_primary_uncached(&self, p_id: DocId) -> Option<PostingsData<TermId, u64>> {
        self.search_primary(p_id)
    }
}

impl DiskIndex for ForwardIndex {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, NgramWordAnalyzer};
    use crate::corpus::LineCorpus;
    use crate::token_stream::{TokenStream, WhitespaceTokenizer};

    fn make_analyzer() -> Box<dyn Analyzer> {
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        Box::new(NgramWordAnalyzer::new(1, stream).unwrap())
    }

    #[test]
    fn transposes_an_inverted_index() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("docs.txt");
        std::fs::write(&text_path, "the cat sat\nthe dog ran\n").unwrap();

        let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
        let inv_prefix = dir.path().join("inv");
        let inv = InvertedIndex::build(&inv_prefix, "inverted-index", corpus, make_analyzer(), None, None).unwrap();

        let fwd_prefix = dir.path().join("fwd");
        let fwd = ForwardIndex::build(&fwd_prefix, "forward-index", &inv, vec![], None, None).unwrap();

        assert_eq!(fwd.num_docs(), 2);
        let the_id = inv.get_term_id("the").unwrap();
        let pdata = fwd.search_primary(DocId::new(0)).unwrap();
        assert_eq!(pdata.count(the_id), 1);
    }
}
