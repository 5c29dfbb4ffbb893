//! Pivoted-length-normalized TF×IDF scoring (§4.10).
//!
//! The Singhal/Buckley/Mitra pivoted normalization is read from
//! `s · tf' · idf` as: `tf' = (1 + ln(1 + ln(tf))) / ((1-s) + s·(ds/avg_dl))`,
//! `s` parameterizing the normalization rather than a bare outer multiplier
//! (an Open Question resolution recorded in DESIGN.md).

use super::score_data::ScoreData;

pub const DEFAULT_SLOPE: f64 = 0.2;

fn idf(num_docs: u64, doc_count: u64) -> f64 {
    (num_docs as f64 / (doc_count as f64).max(1.0)).ln()
}

pub fn score_one(sd: &ScoreData<'_>, slope: f64) -> f64 {
    let tf = sd.doc_term_count as f64;
    if tf <= 0.0 {
        return 0.0;
    }
    let ds = sd.doc_size as f64;
    let pivot_norm = (1.0 - slope) + slope * (ds / sd.avg_dl.max(1.0));
    let log_tf = (1.0 + tf.ln()).ln().max(0.0);
    let tf_prime = (1.0 + log_tf) / pivot_norm;
    idf(sd.num_docs, sd.doc_count) * tf_prime * sd.query_term_weight
}
