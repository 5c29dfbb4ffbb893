//! Dirichlet-prior smoothed query-likelihood scoring (§4.10).
//!
//! Smooths the document's term probability toward the corpus unigram
//! probability with a Dirichlet prior of pseudo-count `μ`, pinned at 2000
//! per the data model.

use super::score_data::ScoreData;

pub const DEFAULT_MU: f64 = 2000.0;

pub fn score_one(sd: &ScoreData<'_>, mu: f64) -> f64 {
    let dtc = sd.doc_term_count as f64;
    let ds = sd.doc_size as f64;
    let p_c = sd.corpus_term_count as f64 / sd.total_terms as f64;
    (1.0 + dtc / (mu * p_c)).ln() + sd.query_term_weight * (mu / (ds + mu)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DiskIndex, InvertedIndex};
    use crate::types::DocId;

    fn fixture() -> (tempfile::TempDir, InvertedIndex) {
        use crate::analyzer::{Analyzer, NgramWordAnalyzer};
        use crate::corpus::LineCorpus;
        use crate::token_stream::{TokenStream, WhitespaceTokenizer};

        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("docs.txt");
        std::fs::write(&text_path, "the cat sat\nthe dog ran far away\n").unwrap();
        let corpus = LineCorpus::open(&text_path, None, "utf-8", false).unwrap();
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        let analyzer: Box<dyn Analyzer> = Box::new(NgramWordAnalyzer::new(1, stream).unwrap());
        let prefix = dir.path().join("idx");
        let idx = InvertedIndex::build(&prefix, "inverted-index", corpus, analyzer, None, None).unwrap();
        (dir, idx)
    }

    #[test]
    fn favors_the_document_the_term_appears_in() {
        let (_dir, idx) = fixture();
        let cat_id = idx.get_term_id("cat").unwrap();
        let sd_present = ScoreData {
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
        let sd_absent = ScoreData {
            d_id: DocId::new(1),
            doc_term_count: idx.term_freq(cat_id, DocId::new(1)),
            doc_size: idx.doc_size(DocId::new(1)),
            doc_unique_terms: idx.unique_terms_for_doc(DocId::new(1)),
            ..sd_present
        };

        assert!(score_one(&sd_present, DEFAULT_MU) > score_one(&sd_absent, DEFAULT_MU));
    }
}
