//! Full build-then-query round trip against a real temp-directory index.
//!
//! Grounded on the unit test fixtures already used throughout `src/ranker/*`
//! and `src/index/forward_index.rs` (`tempfile::tempdir()` + `LineCorpus` +
//! `NgramWordAnalyzer`); exercises the exact corpus and expected ranking
//! from §8's scenario 6 ("Tiny index + BM25").

use meta_index::analyzer::{Analyzer, NgramWordAnalyzer};
use meta_index::corpus::LineCorpus;
use meta_index::index::{DiskIndex, InvertedIndex};
use meta_index::ranker::{self, Query, Ranker, RankerContext};
use meta_index::token_stream::{TokenStream, WhitespaceTokenizer};
use meta_index::types::DocId;

fn make_analyzer() -> Box<dyn Analyzer> {
    let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
    Box::new(NgramWordAnalyzer::new(1, stream).unwrap())
}

#[test]
fn tiny_corpus_statistics_and_bm25_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("docs.txt");
    std::fs::write(&text_path, "cat dog\ncat cat fish\ndog fish bird\n").unwrap();

    let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
    let prefix = dir.path().join("idx");
    let idx = InvertedIndex::build(&prefix, "inverted-index", corpus, make_analyzer(), None, None).unwrap();

    assert_eq!(idx.num_docs(), 3);

    let cat_id = idx.get_term_id("cat").unwrap();
    assert_eq!(idx.doc_freq(cat_id), 2);
    assert_eq!(idx.term_freq(cat_id, DocId::new(1)), 2);
    assert_eq!(idx.avg_doc_length(), (2.0 + 3.0 + 3.0) / 3.0);

    let mut query = Query::new();
    query.insert(cat_id, 1.0);
    let ranker = Ranker::Bm25 { k1: 1.2, b: 0.75, k3: 500.0 };

    let mut ctx = RankerContext::new(&idx, &query);
    let results = ranker::rank(&mut ctx, 10, |sd| ranker.score_one(sd), |_| true);

    let doc_order: Vec<DocId> = results.iter().map(|(d, _)| *d).collect();
    assert_eq!(doc_order, vec![DocId::new(1), DocId::new(0)]);
    assert!(!doc_order.contains(&DocId::new(2)));
}

#[test]
fn reopening_a_built_index_preserves_postings() {
    let dir = tempfile::tempdir().unwrap();
    let text_path = dir.path().join("docs.txt");
    std::fs::write(&text_path, "the quick fox\nthe lazy dog\n").unwrap();

    let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
    let prefix = dir.path().join("idx");
    {
        let idx = InvertedIndex::build(&prefix, "inverted-index", corpus, make_analyzer(), None, None).unwrap();
        assert_eq!(idx.num_docs(), 2);
    }

    let reloaded = InvertedIndex::load(&prefix, "inverted-index", vec![], make_analyzer()).unwrap();
    let the_id = reloaded.get_term_id("the").unwrap();
    assert_eq!(reloaded.doc_freq(the_id), 2);
}
