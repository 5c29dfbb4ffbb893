//! A text-analytics indexing and retrieval core.
//!
//! Tokenizes a corpus through a configurable analyzer pipeline, builds an
//! external-memory postings file and an on-disk vocabulary map, and serves
//! ranked retrieval (BM25, Dirichlet-prior/Jelinek-Mercer/absolute-discount
//! language-model smoothing, pivoted-length normalization, and Rocchio
//! pseudo-relevance feedback) over the resulting mmap-backed indexes.
//!
//! # Pipeline
//!
//! ```text
//! corpus -> analyzer -> chunked postings -> merge -> vocabulary map
//!        -> inverted index (term -> docs) -> forward index (doc -> terms)
//!        -> ranker
//! ```
//!
//! # Layout
//!
//! - [`corpus`] / [`token_stream`] / [`analyzer`]: turn raw documents into
//!   term -> count feature maps.
//! - [`index`]: the on-disk vocabulary map, postings files, and the
//!   [`index::InvertedIndex`] / [`index::ForwardIndex`] built from them.
//! - [`caching`]: a pluggable cache layer (`splay_cache`, `dblru_cache`,
//!   `no_evict_cache`, `shard_cache`) that can wrap either index.
//! - [`ranker`]: the document-at-a-time scoring loop, the scoring
//!   functions, and Rocchio feedback.
//! - [`config`]: the `config.toml` surface driving both CLI commands.
//!
//! # Example
//!
//! ```no_run
//! use meta_index::analyzer::{Analyzer, NgramWordAnalyzer};
//! use meta_index::corpus::LineCorpus;
//! use meta_index::index::{DiskIndex, InvertedIndex};
//! use meta_index::ranker::{self, Query, Ranker};
//! use meta_index::token_stream::{TokenStream, WhitespaceTokenizer};
//!
//! # fn main() -> meta_index::error::Result<()> {
//! let corpus = LineCorpus::open("docs.txt", None, "utf-8", false)?;
//! let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
//! let analyzer: Box<dyn Analyzer> = Box::new(NgramWordAnalyzer::new(1, stream)?);
//! let idx = InvertedIndex::build("idx", "inverted-index", corpus, analyzer, None, None)?;
//!
//! let the_id = idx.get_term_id("the").unwrap();
//! let mut query = Query::new();
//! query.insert(the_id, 1.0);
//! let ranker = Ranker::Bm25 { k1: 1.2, b: 0.75, k3: 500.0 };
//! let results = ranker::search(&idx, None, &ranker, &query, 10, |_| true)?;
//! # let _ = results;
//! # Ok(())
//! # }
//! ```

/// Error types for the indexing and retrieval core.
pub mod error;

/// Core identifier newtypes (`TermId`, `DocId`, `LabelId`, ...) and the
/// `FeatureMap` / metadata value types shared across the rest of the crate.
pub mod types;

/// Packed variable-length integer/float codec used by every on-disk format.
pub mod packed_io;

/// mmap-backed fixed-record primitives (`disk_vector`, `mmap_file`) and the
/// bounded top-k `fixed_heap` container.
pub mod util;

/// Composable token-stream chain: tokenizer plus filters.
pub mod token_stream;

/// Drives a token_stream over a document into a term -> count feature map.
pub mod analyzer;

/// Corpus iteration (`LineCorpus`, `FileCorpus`) feeding the construction
/// driver.
pub mod corpus;

/// On-disk vocabulary map, postings files, and the indexes built from them.
pub mod index;

/// Cache layer (locking_map, splay_cache, dblru_cache, no_evict_cache,
/// shard_cache) and the `cached_index` decorator built on top of them.
pub mod caching;

/// Document-at-a-time ranking: the scoring-function sum type, the five
/// scoring functions, and Rocchio pseudo-relevance feedback.
pub mod ranker;

/// `config.toml` parsing: analyzer pipeline, ranker, and metadata schema
/// declarations (§6).
pub mod config;

pub use error::{MetaError, Result};

/// Re-export of the crate's most commonly used types.
pub mod prelude {
    pub use crate::analyzer::{Analyzer, NgramWordAnalyzer};
    pub use crate::config::Config;
    pub use crate::corpus::{Corpus, FileCorpus, LineCorpus};
    pub use crate::error::{MetaError, Result};
    pub use crate::index::{DiskIndex, ForwardIndex, InvertedIndex};
    pub use crate::ranker::{self, Query, Ranker, RankerParams};
    pub use crate::token_stream::{TokenStream, WhitespaceTokenizer};
    pub use crate::types::{DocId, LabelId, TermId};
}
