//! BM25 ranking throughput over a synthetic corpus.
//!
//! Grounded structurally on the teacher's `benches/ann_benchmarks.rs`
//! (`criterion_group!`/`criterion_main!`, `BenchmarkId` over a size sweep,
//! `black_box`-guarded hot path); this crate ranks rather than builds an
//! ANN index, so the sweep is over corpus size with a fixed query.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use meta_index::analyzer::{Analyzer, NgramWordAnalyzer};
use meta_index::corpus::LineCorpus;
use meta_index::index::{DiskIndex, InvertedIndex};
use meta_index::ranker::{self, Query, Ranker, RankerContext};
use meta_index::token_stream::{TokenStream, WhitespaceTokenizer};

const VOCAB: &[&str] = &[
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
];

fn make_analyzer() -> Box<dyn Analyzer> {
    let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
    Box::new(NgramWordAnalyzer::new(1, stream).unwrap())
}

fn build_corpus(dir: &std::path::Path, num_docs: usize) -> InvertedIndex {
    let text_path = dir.join("docs.txt");
    let mut text = String::new();
    for i in 0..num_docs {
        for j in 0..8 {
            text.push_str(VOCAB[(i + j) % VOCAB.len()]);
            text.push(' ');
        }
        text.push('\n');
    }
    std::fs::write(&text_path, text).unwrap();

    let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
    let prefix = dir.join("idx");
    InvertedIndex::build(&prefix, "inverted-index", corpus, make_analyzer(), None, None).unwrap()
}

fn bench_rank(c: &mut Criterion) {
    for &num_docs in &[100usize, 1_000, 10_000] {
        let dir = tempfile::tempdir().unwrap();
        let idx = build_corpus(dir.path(), num_docs);
        let alpha_id = idx.get_term_id("alpha").unwrap();
        let mut query = Query::new();
        query.insert(alpha_id, 1.0);
        let ranker = Ranker::Bm25 {
            k1: meta_index::ranker::bm25::DEFAULT_K1,
            b: meta_index::ranker::bm25::DEFAULT_B,
            k3: meta_index::ranker::bm25::DEFAULT_K3,
        };

        c.bench_with_input(BenchmarkId::new("bm25_rank", num_docs), &num_docs, |b, _| {
            b.iter(|| {
                let mut ctx = RankerContext::new(&idx, &query);
                let results = ranker::rank(&mut ctx, 10, |sd| ranker.score_one(sd), |_| true);
                black_box(results);
            });
        });
    }
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
