//! Drives a `token_stream` over a document and emits a term -> count
//! feature map.
//!
//! Grounded on `include/analyzers/analyzer.h`: the source's virtual
//! `tokenize`/`clone` pair becomes a trait; the source's
//! `analyzer_factory` singleton (per §9 REDESIGN FLAGS, "Singletons for
//! factories" -> "process-wide static registries guarded by
//! once-initialization") becomes a `OnceLock<Mutex<HashMap<...>>>`
//! registry seeded with the in-core analyzers at first use.

pub mod ngram_word;

pub use ngram_word::NgramWordAnalyzer;

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::corpus::Document;
use crate::error::MetaError;
use crate::token_stream::TokenStream;
use crate::types::FeatureMap;

/// Per-analyzer configuration, as assembled from an `[[analyzers]]` table
/// entry plus its nested filter chain (§6).
pub struct AnalyzerConfig {
    pub ngram: Option<usize>,
    pub filter_chain: Box<dyn TokenStream>,
}

pub trait Analyzer: CloneAnalyzer {
    fn tokenize(&mut self, doc: &Document) -> Result<FeatureMap<String>, MetaError>;
}

pub trait CloneAnalyzer {
    fn clone_box(&self) -> Box<dyn Analyzer>;
}

impl Clone for Box<dyn Analyzer> {
    fn clone(&self) -> Box<dyn Analyzer> {
        CloneAnalyzer::clone_box(self.as_ref())
    }
}

type AnalyzerFactory = fn(AnalyzerConfig) -> Result<Box<dyn Analyzer>, MetaError>;

static REGISTRY: OnceLock<Mutex<HashMap<&'static str, AnalyzerFactory>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<&'static str, AnalyzerFactory>> {
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, AnalyzerFactory> = HashMap::new();
        map.insert("ngram-word", create_ngram_word as AnalyzerFactory);
        map.insert("tree", create_unsupported as AnalyzerFactory);
        map.insert("diff", create_unsupported as AnalyzerFactory);
        map.insert("libsvm", create_unsupported as AnalyzerFactory);
        Mutex::new(map)
    })
}

/// Registers a user-pluggable analyzer constructor under `id`, overwriting
/// any existing entry (including a built-in one).
pub fn register_analyzer(id: &'static str, factory: AnalyzerFactory) {
    registry()
        .lock()
        .expect("analyzer registry mutex poisoned")
        .insert(id, factory);
}

/// Looks up `id` in the registry and constructs an analyzer from `config`.
pub fn create_analyzer(id: &str, config: AnalyzerConfig) -> Result<Box<dyn Analyzer>, MetaError> {
    let factory = {
        let reg = registry().lock().expect("analyzer registry mutex poisoned");
        *reg.get(id)
            .ok_or_else(|| MetaError::Config(format!("unknown analyzer id \"{id}\"")))?
    };
    factory(config)
}

fn create_ngram_word(config: AnalyzerConfig) -> Result<Box<dyn Analyzer>, MetaError> {
    let n = config
        .ngram
        .ok_or_else(|| MetaError::Config("ngram size needed for ngram-word analyzer".to_owned()))?;
    Ok(Box::new(NgramWordAnalyzer::new(n, config.filter_chain)?))
}

fn create_unsupported(_config: AnalyzerConfig) -> Result<Box<dyn Analyzer>, MetaError> {
    Err(MetaError::Config(
        "analyzer variant not supported by this core (tree/diff/libsvm are out of scope)"
            .to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DocContent;
    use crate::token_stream::WhitespaceTokenizer;
    use crate::types::DocId;

    #[test]
    fn creates_ngram_word_analyzer_by_id() {
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        let config = AnalyzerConfig {
            ngram: Some(1),
            filter_chain: stream,
        };
        let mut analyzer = create_analyzer("ngram-word", config).unwrap();
        let doc = Document::new(DocId::new(0), None, "utf-8")
            .with_content(DocContent::Inline("a b".to_owned()));
        let counts = analyzer.tokenize(&doc).unwrap();
        assert_eq!(counts.get("a").copied(), Some(1));
    }

    #[test]
    fn unknown_id_is_config_error() {
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        let config = AnalyzerConfig {
            ngram: Some(1),
            filter_chain: stream,
        };
        assert!(create_analyzer("nonexistent", config).is_err());
    }

    #[test]
    fn tree_variant_is_explicitly_unsupported() {
        let stream: Box<dyn TokenStream> = Box::new(WhitespaceTokenizer::new());
        let config = AnalyzerConfig {
            ngram: None,
            filter_chain: stream,
        };
        assert!(create_analyzer("tree", config).is_err());
    }
}
