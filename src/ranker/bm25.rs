//! Okapi BM25 scoring (§4.10).
//!
//! Idf plus a saturating term-frequency component, as a free function over
//! per-term statistics; the exact idf formula and constants are pinned by
//! the data model: `log((N - df + 0.5) / (df + 0.5))`, clamped at 0 from
//! below, with no `+1.0` inside the log.

use super::score_data::ScoreData;

pub const DEFAULT_K1: f64 = 1.2;
pub const DEFAULT_B: f64 = 0.75;
pub const DEFAULT_K3: f64 = 500.0;

/// `log((N - df + 0.5) / (df + 0.5))`, clamped at 0 from below.
fn idf(num_docs: u64, doc_count: u64) -> f64 {
    let n = num_docs as f64;
    let df = doc_count as f64;
    (((n - df + 0.5) / (df + 0.5)).ln()).max(0.0)
}

pub fn score_one(sd: &ScoreData<'_>, k1: f64, b: f64, k3: f64) -> f64 {
    let tf = sd.doc_term_count as f64;
    let dl = sd.doc_size as f64;
    let norm = 1.0 - b + b * (dl / sd.avg_dl.max(1.0));
    let tf_component = (tf * (k1 + 1.0)) / (tf + k1 * norm);
    let qtf_component = ((k3 + 1.0) * sd.query_term_weight) / (k3 + sd.query_term_weight);
    idf(sd.num_docs, sd.doc_count) * tf_component * qtf_component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DiskIndex, InvertedIndex};
    use crate::types::DocId;

    fn fixture_index() -> (tempfile::TempDir, InvertedIndex) {
        use crate::analyzer::{Analyzer, NgramWordAnalyzer};
        use crate::corpus::LineCorpus;
        use crate::token_stream::{TokenStream, WhitespaceTokenizer};

        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("docs.txt");
        std::fs::write(&text_path, "the cat sat on the mat\nthe dog ran\n").unwrap();
        let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        let analyzer: Box<dyn Analyzer> = Box::new(NgramWordAnalyzer::new(1, stream).unwrap());
        let prefix = dir.path().join("idx");
        let idx = InvertedIndex::build(&prefix, "inverted-index", corpus, analyzer, None, None).unwrap();
        (dir, idx)
    }

    #[test]
    fn scores_a_more_frequent_term_higher() {
        let (_dir, idx) = fixture_index();
        let cat_id = idx.get_term_id("cat").unwrap();
        let the_id = idx.get_term_id("the").unwrap();

        let sd_rare = ScoreData {
            idx: &idx,
            avg_dl: idx.avg_doc_length(),
            num_docs: idx.num_docs(),
            total_terms: idx.total_corpus_terms(),
            query_length: 1.0,
            t_id: cat_id,
            query_term_weight: 1.0,
            doc_count: idx.doc_freq(cat_id),
            corpus_term_count: idx.total_num_occurences(cat_id),
            d_id: DocId::new(0),
            doc_term_count: idx.term_freq(cat_id, DocId::new(0)),
            doc_size: idx.doc_size(DocId::new(0)),
            doc_unique_terms: idx.unique_terms_for_doc(DocId::new(0)),
        };
        let sd_common = ScoreData {
            t_id: the_id,
            doc_term_count: idx.term_freq(the_id, DocId::new(0)),
            doc_count: idx.doc_freq(the_id),
            corpus_term_count: idx.total_num_occurences(the_id),
            ..sd_rare
        };

        let score_rare = score_one(&sd_rare, DEFAULT_K1, DEFAULT_B, DEFAULT_K3);
        let score_common = score_one(&sd_common, DEFAULT_K1, DEFAULT_B, DEFAULT_K3);
        assert!(score_rare > score_common);
    }

    #[test]
    fn idf_is_clamped_at_zero_for_ubiquitous_terms() {
        assert_eq!(idf(2, 2), 0.0_f64.max(idf(2, 2)));
        assert!(idf(2, 2) >= 0.0);
    }
}
