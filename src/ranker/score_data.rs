//! Per-(query-term, document) statistics handed to a scoring function.
//!
//! Grounded on `include/meta/index/score_data.h`: the same field set, with
//! the source's `inverted_index&` reference member becoming a borrow with
//! an explicit lifetime rather than a raw reference.

use crate::index::InvertedIndex;
use crate::types::{DocId, TermId};

/// Everything a [`crate::ranker::Ranker`]'s `score_one` needs to score one
/// matched `(term, document)` pair. Built fresh by the DAAT loop for each
/// match; no scoring function reads postings outside of it.
#[derive(Clone, Copy)]
pub struct ScoreData<'idx> {
    pub idx: &'idx InvertedIndex,
    pub avg_dl: f64,
    pub num_docs: u64,
    pub total_terms: u64,
    pub query_length: f64,

    pub t_id: TermId,
    pub query_term_weight: f64,
    pub doc_count: u64,
    pub corpus_term_count: u64,

    pub d_id: DocId,
    pub doc_term_count: u64,
    pub doc_size: u64,
    pub doc_unique_terms: u64,
}
