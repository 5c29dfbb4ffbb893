//! Rocchio pseudo-relevance feedback (§4.9): wraps another ranker, re-runs
//! it once to gather feedback documents, expands the query from their
//! term-count centroid, then re-runs the wrapped ranker on the expanded
//! query.
//!
//! Defaults confirmed verbatim against
//! `include/meta/index/ranker/rocchio.h` (`default_alpha=1.0`,
//! `default_beta=0.8`, `default_k=10`, `default_max_terms=50`); the
//! centroid-then-reweight algorithm itself is this crate's rendering of
//! the header's documented `rank` override, since its `.cpp`/`.tcc` body
//! was not part of the retrieved source pack.

use std::collections::HashMap;

use crate::index::{DiskIndex, ForwardIndex, InvertedIndex};
use crate::types::{DocId, TermId};

use super::score_data::ScoreData;
use super::{rank, Query, Ranker, RankerContext};

pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_BETA: f64 = 0.8;
pub const DEFAULT_K: u64 = 10;
pub const DEFAULT_MAX_TERMS: u64 = 50;

/// Builds the count-space centroid `centroid[t] = (1/|F|) * sum(tf(t, d))`
/// over `feedback_docs`, reading each document's term counts from `fwd`.
fn build_centroid(fwd: &ForwardIndex, feedback_docs: &[DocId]) -> HashMap<TermId, f64> {
    let mut centroid: HashMap<TermId, f64> = HashMap::new();
    for &d_id in feedback_docs {
        if let Some(pdata) = fwd.search_primary(d_id) {
            for (&t_id, &count) in pdata.counts() {
                *centroid.entry(t_id).or_insert(0.0) += count as f64;
            }
        }
    }
    let num_feedback = feedback_docs.len().max(1) as f64;
    for weight in centroid.values_mut() {
        *weight /= num_feedback;
    }
    centroid
}

/// Ranks centroid terms by `inner.score_one` against `idx`'s corpus-wide
/// statistics, treating the centroid as a single virtual document of
/// average feedback length, and keeps the top `max_terms`.
fn select_expansion_terms(
    idx: &InvertedIndex,
    inner: &Ranker,
    centroid: &HashMap<TermId, f64>,
    avg_feedback_doc_size: u64,
    max_terms: u64,
) -> Vec<(TermId, f64)> {
    let num_unique = centroid.len() as u64;
    let mut scored: Vec<(TermId, f64)> = centroid
        .iter()
        .filter_map(|(&t_id, &weight)| {
            if idx.doc_freq(t_id) == 0 {
                return None;
            }
            let sd = ScoreData {
                idx,
                avg_dl: idx.avg_doc_length(),
                num_docs: idx.num_docs(),
                total_terms: idx.total_corpus_terms(),
                query_length: 1.0,
                t_id,
                query_term_weight: 1.0,
                doc_count: idx.doc_freq(t_id),
                corpus_term_count: idx.total_num_occurences(t_id),
                d_id: DocId::new(0),
                doc_term_count: weight.round() as u64,
                doc_size: avg_feedback_doc_size.max(1),
                doc_unique_terms: num_unique,
            };
            Some((t_id, inner.score_one(&sd)))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max_terms as usize);
    scored
}

#[allow(clippy::too_many_arguments)]
pub fn rank_with_feedback(
    idx: &InvertedIndex,
    fwd: &ForwardIndex,
    inner: &Ranker,
    query: &Query,
    num_results: usize,
    filter: &impl Fn(DocId) -> bool,
    alpha: f64,
    beta: f64,
    k: u64,
    max_terms: u64,
) -> Vec<(DocId, f64)> {
    let feedback_docs: Vec<DocId> = {
        let mut ctx = RankerContext::new(idx, query);
        rank(&mut ctx, k as usize, |sd| inner.score_one(sd), |_| true)
            .into_iter()
            .map(|(d, _)| d)
            .collect()
    };

    if feedback_docs.is_empty() {
        let mut ctx = RankerContext::new(idx, query);
        return rank(&mut ctx, num_results, |sd| inner.score_one(sd), filter);
    }

    let centroid = build_centroid(fwd, &feedback_docs);
    let avg_feedback_doc_size = {
        let total: u64 = feedback_docs.iter().map(|&d| idx.doc_size(d)).sum();
        total / feedback_docs.len() as u64
    };
    let expansion_terms = select_expansion_terms(idx, inner, &centroid, avg_feedback_doc_size, max_terms);

    let mut new_query: Query = HashMap::new();
    for (&t_id, &weight) in query.iter().filter(|&(_, &w)| w > 0.0) {
        new_query.insert(t_id, alpha * weight);
    }
    for (t_id, centroid_weight) in expansion_terms {
        *new_query.entry(t_id).or_insert(0.0) += beta * centroid_weight;
    }

    let mut ctx = RankerContext::new(idx, &new_query);
    rank(&mut ctx, num_results, |sd| inner.score_one(sd), filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, NgramWordAnalyzer};
    use crate::corpus::LineCorpus;
    use crate::token_stream::{TokenStream, WhitespaceTokenizer};

    fn fixture() -> (tempfile::TempDir, InvertedIndex, ForwardIndex) {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("docs.txt");
        std::fs::write(
            &text_path,
            "cat feline whiskers\ndog canine bark\ncat feline purr nap\nrocket engine launch\n",
        )
        .unwrap();
        let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        let analyzer: Box<dyn Analyzer> = Box::new(NgramWordAnalyzer::new(1, stream).unwrap());
        let inv_prefix = dir.path().join("inv");
        let idx = InvertedIndex::build(&inv_prefix, "inverted-index", corpus, analyzer, None, None).unwrap();
        let fwd_prefix = dir.path().join("fwd");
        let fwd = ForwardIndex::build(&fwd_prefix, "forward-index", &idx, vec![], None, None).unwrap();
        (dir, idx, fwd)
    }

    #[test]
    fn expands_the_query_toward_feedback_vocabulary() {
        let (_dir, idx, fwd) = fixture();
        let cat_id = idx.get_term_id("cat").unwrap();
        let feline_id = idx.get_term_id("feline").unwrap();

        let mut query = Query::new();
        query.insert(cat_id, 1.0);

        let inner = Ranker::Bm25 {
            k1: crate::ranker::bm25::DEFAULT_K1,
            b: crate::ranker::bm25::DEFAULT_B,
            k3: crate::ranker::bm25::DEFAULT_K3,
        };

        let results = rank_with_feedback(
            &idx,
            &fwd,
            &inner,
            &query,
            10,
            &|_| true,
            DEFAULT_ALPHA,
            DEFAULT_BETA,
            DEFAULT_K,
            DEFAULT_MAX_TERMS,
        );

        assert!(!results.is_empty());
        // "feline" co-occurs with "cat" in both feedback docs, so it should
        // have been pulled into the expanded query and contributed score
        // to documents containing it alone -- exercised indirectly by
        // checking the centroid building block directly below.
        let feedback_docs: Vec<DocId> = results.iter().map(|(d, _)| *d).collect();
        let centroid = build_centroid(&fwd, &feedback_docs);
        assert!(centroid.contains_key(&feline_id) || centroid.contains_key(&cat_id));
    }
}
