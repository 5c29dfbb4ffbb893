//! Ranking: the document-at-a-time scoring loop, the five scoring
//! functions, and Rocchio pseudo-relevance feedback (§4.9, §4.10).
//!
//! Grounded on `include/meta/index/ranker/ranker.h`'s `ranker_context`/
//! `rank` shape: per query term with weight > 0, a postings-stream cursor
//! sorted by current doc_id, advanced in lockstep so each matching document
//! is scored exactly once. `Ranker` is a closed sum type (§9 REDESIGN
//! FLAGS) rather than the source's virtual-dispatch `ranker` base class,
//! since Rust has no open-ended subclassing to mirror `ranker_factory.h`'s
//! registration pattern; [`build`] plays the factory's role, keyed by the
//! `method` string from the `[ranker]` config table (§6).

pub mod absolute_discount;
pub mod bm25;
pub mod dirichlet_prior;
pub mod jelinek_mercer;
pub mod pivoted_length;
pub mod rocchio;
pub mod score_data;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::iter::Peekable;

use crate::error::{MetaError, Result};
use crate::index::postings_stream::PostingsStreamIter;
use crate::index::{DiskIndex, ForwardIndex, InvertedIndex};
use crate::types::{DocId, TermId};
use crate::util::fixed_heap::FixedHeap;

use score_data::ScoreData;

/// A parsed query: term id -> weight. A term absent from the map, or with
/// weight <= 0, is treated as not present in the query.
pub type Query = HashMap<TermId, f64>;

/// One query term's live cursor into its postings stream, plus the
/// corpus-wide statistics the DAAT loop needs to populate a [`ScoreData`]
/// without looking either up twice.
struct TermCursor<'idx> {
    t_id: TermId,
    weight: f64,
    doc_count: u64,
    corpus_term_count: u64,
    iter: Peekable<PostingsStreamIter<'idx, DocId, u64>>,
}

/// Per-query state assembled once and driven to exhaustion by [`rank`].
pub struct RankerContext<'idx> {
    idx: &'idx InvertedIndex,
    avg_dl: f64,
    num_docs: u64,
    total_terms: u64,
    query_length: f64,
    terms: Vec<TermCursor<'idx>>,
}

impl<'idx> RankerContext<'idx> {
    /// Builds a context for `query` against `idx`. Terms absent from the
    /// vocabulary, or with non-positive weight, contribute no cursor --
    /// this is how a query with no matching terms ends up with an empty
    /// `terms` list, and `rank` then returns an empty result rather than
    /// erroring (§4.9's boundary rule).
    pub fn new(idx: &'idx InvertedIndex, query: &Query) -> Self {
        let query_length: f64 = query.values().filter(|&&w| w > 0.0).sum();
        let mut terms = Vec::new();
        for (&t_id, &weight) in query {
            if weight <= 0.0 {
                continue;
            }
            if let Some(stream) = idx.stream_for(t_id) {
                terms.push(TermCursor {
                    t_id,
                    weight,
                    doc_count: stream.size(),
                    corpus_term_count: stream.total_counts(),
                    iter: stream.iter().peekable(),
                });
            }
        }
        RankerContext {
            idx,
            avg_dl: idx.avg_doc_length(),
            num_docs: idx.num_docs(),
            total_terms: idx.total_corpus_terms(),
            query_length,
            terms,
        }
    }
}

/// A document/score pair ordered for [`FixedHeap`]: score ascending, with
/// ties broken so that the *larger* doc_id compares smaller -- `FixedHeap`
/// evicts its minimum first and `extract_top` sorts descending, so this
/// ordering surfaces results score-descending with doc_id-ascending ties,
/// matching §4.9's boundary rule.
struct ScoredDoc {
    d_id: DocId,
    score: f64,
}

impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.d_id == other.d_id
    }
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.d_id.cmp(&self.d_id))
    }
}

/// Runs the DAAT loop (§4.9) over `ctx`, scoring each matching document
/// with `score_one` and keeping up to `num_results` documents for which
/// `filter` returns true, sorted by score descending (ties broken by
/// doc_id ascending). A score of exactly 0.0 is kept as long as at least
/// one term matched the document.
pub fn rank(
    ctx: &mut RankerContext<'_>,
    num_results: usize,
    score_one: impl Fn(&ScoreData<'_>) -> f64,
    filter: impl Fn(DocId) -> bool,
) -> Vec<(DocId, f64)> {
    let mut heap: FixedHeap<ScoredDoc> = FixedHeap::new(num_results);

    loop {
        let min_doc = ctx
            .terms
            .iter_mut()
            .filter_map(|t| t.iter.peek().map(|&(d, _)| d))
            .min();
        let Some(d_id) = min_doc else { break };

        let mut score = 0.0;
        for term in ctx.terms.iter_mut() {
            let at_min = matches!(term.iter.peek(), Some(&(d, _)) if d == d_id);
            if !at_min {
                continue;
            }
            let (_, doc_term_count) = term.iter.next().expect("peeked Some above");
            let sd = ScoreData {
                idx: ctx.idx,
                avg_dl: ctx.avg_dl,
                num_docs: ctx.num_docs,
                total_terms: ctx.total_terms,
                query_length: ctx.query_length,
                t_id: term.t_id,
                query_term_weight: term.weight,
                doc_count: term.doc_count,
                corpus_term_count: term.corpus_term_count,
                d_id,
                doc_term_count,
                doc_size: ctx.idx.doc_size(d_id),
                doc_unique_terms: ctx.idx.unique_terms_for_doc(d_id),
            };
            score += score_one(&sd);
        }

        if filter(d_id) {
            heap.push(ScoredDoc { d_id, score });
        }
    }

    heap.extract_top().into_iter().map(|s| (s.d_id, s.score)).collect()
}

/// A selectable scoring strategy. Closed rather than an open trait-object
/// hierarchy (§9 REDESIGN FLAGS) -- the scoring functions are pure and
/// finite in number, so a `match` in [`Ranker::score_one`] replaces the
/// source's virtual dispatch through `ranker_factory`.
pub enum Ranker {
    Bm25 { k1: f64, b: f64, k3: f64 },
    DirichletPrior { mu: f64 },
    JelinekMercer { lambda: f64 },
    AbsoluteDiscount { delta: f64 },
    PivotedLength { slope: f64 },
    /// Wraps `inner`, re-ranking via Rocchio pseudo-relevance feedback.
    Rocchio {
        inner: Box<Ranker>,
        alpha: f64,
        beta: f64,
        k: u64,
        max_terms: u64,
    },
}

impl Ranker {
    pub fn score_one(&self, sd: &ScoreData<'_>) -> f64 {
        match self {
            Ranker::Bm25 { k1, b, k3 } => bm25::score_one(sd, *k1, *b, *k3),
            Ranker::DirichletPrior { mu } => dirichlet_prior::score_one(sd, *mu),
            Ranker::JelinekMercer { lambda } => jelinek_mercer::score_one(sd, *lambda),
            Ranker::AbsoluteDiscount { delta } => absolute_discount::score_one(sd, *delta),
            Ranker::PivotedLength { slope } => pivoted_length::score_one(sd, *slope),
            Ranker::Rocchio { inner, .. } => inner.score_one(sd),
        }
    }
}

/// Ranker configuration knobs, as parsed from the `[ranker]` config table
/// (§6). Every field is optional; an absent field falls back to the
/// relevant scoring function's own default.
#[derive(Debug, Clone, Default)]
pub struct RankerParams {
    pub mu: Option<f64>,
    pub lambda: Option<f64>,
    pub delta: Option<f64>,
    pub k1: Option<f64>,
    pub b: Option<f64>,
    pub k3: Option<f64>,
    pub s: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub k: Option<u64>,
    pub max_terms: Option<u64>,
}

/// Builds a [`Ranker`] from a `method` id and its parameters (§6's
/// `[ranker].method` plus ranker-specific keys). `feedback`, when given,
/// wraps the built ranker in [`Ranker::Rocchio`] using its own
/// `alpha`/`beta`/`k`/`max-terms`, mirroring the config's nested
/// `[ranker.feedback]` sub-table.
pub fn build(method: &str, params: &RankerParams, feedback: Option<&RankerParams>) -> Result<Ranker> {
    let base = match method {
        "bm25" => Ranker::Bm25 {
            k1: params.k1.unwrap_or(bm25::DEFAULT_K1),
            b: params.b.unwrap_or(bm25::DEFAULT_B),
            k3: params.k3.unwrap_or(bm25::DEFAULT_K3),
        },
        "dirichlet-prior" => Ranker::DirichletPrior {
            mu: params.mu.unwrap_or(dirichlet_prior::DEFAULT_MU),
        },
        "jelinek-mercer" => Ranker::JelinekMercer {
            lambda: params.lambda.unwrap_or(jelinek_mercer::DEFAULT_LAMBDA),
        },
        "absolute-discount" => Ranker::AbsoluteDiscount {
            delta: params.delta.unwrap_or(absolute_discount::DEFAULT_DELTA),
        },
        "pivoted-length" => Ranker::PivotedLength {
            slope: params.s.unwrap_or(pivoted_length::DEFAULT_SLOPE),
        },
        other => return Err(MetaError::Ranker(format!("unknown ranker method \"{other}\""))),
    };

    match feedback {
        Some(fb) => Ok(Ranker::Rocchio {
            inner: Box::new(base),
            alpha: fb.alpha.unwrap_or(rocchio::DEFAULT_ALPHA),
            beta: fb.beta.unwrap_or(rocchio::DEFAULT_BETA),
            k: fb.k.unwrap_or(rocchio::DEFAULT_K),
            max_terms: fb.max_terms.unwrap_or(rocchio::DEFAULT_MAX_TERMS),
        }),
        None => Ok(base),
    }
}

/// Runs `ranker` against `query`, returning up to `num_results` documents
/// for which `filter` holds, best-first. [`Ranker::Rocchio`] requires
/// `fwd`, since expanding the query needs per-feedback-document term
/// counts that only the forward index provides.
pub fn search(
    idx: &InvertedIndex,
    fwd: Option<&ForwardIndex>,
    ranker: &Ranker,
    query: &Query,
    num_results: usize,
    filter: impl Fn(DocId) -> bool,
) -> Result<Vec<(DocId, f64)>> {
    if let Ranker::Rocchio {
        inner,
        alpha,
        beta,
        k,
        max_terms,
    } = ranker
    {
        let fwd = fwd.ok_or_else(|| {
            MetaError::Ranker("rocchio feedback requires a forward index".to_owned())
        })?;
        return Ok(rocchio::rank_with_feedback(
            idx,
            fwd,
            inner,
            query,
            num_results,
            &filter,
            *alpha,
            *beta,
            *k,
            *max_terms,
        ));
    }

    let mut ctx = RankerContext::new(idx, query);
    Ok(rank(&mut ctx, num_results, |sd| ranker.score_one(sd), filter))
}
