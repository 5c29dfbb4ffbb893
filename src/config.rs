//! TOML configuration surface (§6): the on-disk `config.toml` that drives
//! both the `index` and `query` CLI commands.
//!
//! A `serde::Deserialize` struct loaded with the `toml` crate, with nested
//! tables for the analyzer chain, ranker, and metadata schema.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analyzer::{self, Analyzer, AnalyzerConfig};
use crate::corpus::LineCorpus;
use crate::error::{MetaError, Result};
use crate::index::metadata::MetadataSchema;
use crate::ranker::{self, Ranker, RankerParams};
use crate::token_stream::{self, ListFilter, TokenStream};
use crate::types::MetadataFieldType;

fn default_encoding() -> String {
    "utf-8".to_owned()
}

/// Top-level `config.toml` contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub prefix: PathBuf,
    pub dataset: String,
    /// Path (relative to `prefix`) of the corpus's single-file-per-line
    /// text, as produced by a MeTA-style `line.toml` corpus spec.
    pub corpus: PathBuf,
    /// Directory name the built index is written under, inside `prefix`.
    pub index: String,
    #[serde(default)]
    pub forward_index: Option<String>,
    #[serde(default)]
    pub inverted_index: Option<String>,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub store_full_text: bool,

    #[serde(default, rename = "analyzers")]
    pub analyzers: Vec<AnalyzerEntry>,

    #[serde(default)]
    pub ranker: Option<RankerEntry>,

    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// One `[[analyzers]]` table entry (§6).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalyzerEntry {
    pub method: String,
    #[serde(default)]
    pub ngram: Option<usize>,
    #[serde(default)]
    pub filter: Vec<FilterEntry>,
}

/// One link of a `filter` chain, keyed by `type` plus filter-specific keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub method: Option<String>,
}

/// The `[ranker]` table (§6): a `method` id, that method's own parameter
/// keys flattened alongside it, and an optional nested `[ranker.feedback]`
/// sub-table whose presence activates Rocchio wrapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RankerEntry {
    pub method: String,
    #[serde(flatten)]
    pub params: RankerParamsEntry,
    #[serde(default)]
    pub feedback: Option<RankerParamsEntry>,
}

/// Flattened numeric/count knobs shared by every scoring method and by the
/// feedback sub-table; unused keys for a given `method` are simply ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RankerParamsEntry {
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

impl From<&RankerParamsEntry> for RankerParams {
    fn from(e: &RankerParamsEntry) -> Self {
        RankerParams {
            mu: e.mu,
            lambda: e.lambda,
            delta: e.delta,
            k1: e.k1,
            b: e.b,
            k3: e.k3,
            s: e.s,
            alpha: e.alpha,
            beta: e.beta,
            k: e.k,
            max_terms: e.max_terms,
        }
    }
}

/// One `[metadata]` schema declaration (§6): `{name, type}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetadataEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: MetadataFieldTypeEntry,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataFieldTypeEntry {
    Int,
    Uint,
    Double,
    String,
}

impl From<MetadataFieldTypeEntry> for MetadataFieldType {
    fn from(t: MetadataFieldTypeEntry) -> Self {
        match t {
            MetadataFieldTypeEntry::Int => MetadataFieldType::SignedInt,
            MetadataFieldTypeEntry::Uint => MetadataFieldType::UnsignedInt,
            MetadataFieldTypeEntry::Double => MetadataFieldType::Double,
            MetadataFieldTypeEntry::String => MetadataFieldType::String,
        }
    }
}

impl Config {
    /// Reads and parses `path` as a `config.toml` document.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
        let config: Config = toml::from_str(&text)?;
        log::debug!("loaded config \"{}\" from {}", config.dataset, path.display());
        Ok(config)
    }

    pub fn index_prefix(&self) -> PathBuf {
        self.prefix.join(&self.index)
    }

    /// Directory the inverted index's own files live under, nested inside
    /// [`Self::index_prefix`] since the forward index's shared per-document
    /// tables are copied alongside it rather than sharing one directory.
    pub fn inverted_index_prefix(&self) -> PathBuf {
        self.index_prefix().join("inverted")
    }

    pub fn forward_index_prefix(&self) -> PathBuf {
        self.index_prefix().join("forward")
    }

    fn corpus_path(&self) -> PathBuf {
        self.prefix.join(&self.corpus)
    }

    /// Opens the configured corpus; a sibling `<corpus>.labels` file, if
    /// present, supplies per-line class labels.
    pub fn open_corpus(&self) -> Result<LineCorpus> {
        let text_path = self.corpus_path();
        let label_path = text_path.with_extension("labels");
        let label_path = label_path.exists().then_some(label_path);
        LineCorpus::open(text_path, label_path, self.encoding.clone(), self.store_full_text)
    }

    /// Builds the analyzer named by the first `[[analyzers]]` entry,
    /// chaining its `filter` list onto the base whitespace tokenizer.
    pub fn build_analyzer(&self) -> Result<Box<dyn Analyzer>> {
        let entry = self
            .analyzers
            .first()
            .ok_or_else(|| MetaError::Config("config needs at least one [[analyzers]] entry".to_owned()))?;

        let mut stream: Box<dyn TokenStream> = Box::new(token_stream::WhitespaceTokenizer::new());
        for filter in &entry.filter {
            stream = build_filter(stream, filter)?;
        }

        let analyzer_config = AnalyzerConfig {
            ngram: entry.ngram,
            filter_chain: stream,
        };
        analyzer::create_analyzer(&entry.method, analyzer_config)
    }

    /// Builds the configured scoring strategy from `[ranker]`, wrapping it
    /// in Rocchio feedback iff `[ranker.feedback]` is present.
    pub fn build_ranker(&self) -> Result<Ranker> {
        let entry = self
            .ranker
            .as_ref()
            .ok_or_else(|| MetaError::Config("config needs a [ranker] table".to_owned()))?;
        let params = RankerParams::from(&entry.params);
        let feedback = entry.feedback.as_ref().map(RankerParams::from);
        ranker::build(&entry.method, &params, feedback.as_ref())
    }

    /// Builds the `[metadata]` schema, in declaration order.
    pub fn metadata_schema(&self) -> MetadataSchema {
        self.metadata
            .iter()
            .map(|e| (e.name.clone(), e.field_type.into()))
            .collect()
    }
}

fn build_filter(source: Box<dyn TokenStream>, filter: &FilterEntry) -> Result<Box<dyn TokenStream>> {
    match filter.kind.as_str() {
        "blank" => Ok(Box::new(token_stream::BlankFilter::new(source))),
        "empty-sentence" => Ok(Box::new(token_stream::EmptySentenceFilter::new(source))),
        "english-normalizer" => Ok(Box::new(token_stream::EnglishNormalizer::new(source))),
        "length" => {
            let min = filter
                .min
                .ok_or_else(|| MetaError::Config("length filter needs \"min\"".to_owned()))?;
            let max = filter
                .max
                .ok_or_else(|| MetaError::Config("length filter needs \"max\"".to_owned()))?;
            Ok(Box::new(token_stream::LengthFilter::new(source, min, max)))
        }
        "list" => {
            let file = filter
                .file
                .as_ref()
                .ok_or_else(|| MetaError::Config("list filter needs \"file\"".to_owned()))?;
            let method = match filter.method.as_deref() {
                Some("accept") => token_stream::list_filter::ListMethod::Accept,
                Some("reject") | None => token_stream::list_filter::ListMethod::Reject,
                Some(other) => {
                    return Err(MetaError::Config(format!("unknown list filter method \"{other}\"")))
                }
            };
            Ok(Box::new(ListFilter::new(source, file, method)?))
        }
        other => Err(MetaError::Config(format!("unknown filter type \"{other}\""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let toml_text = r#"
            prefix = "."
            dataset = "toy"
            corpus = "docs.txt"
            index = "idx"

            [[analyzers]]
            method = "ngram-word"
            ngram = 1

            [ranker]
            method = "bm25"
            k1 = 1.5
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.dataset, "toy");
        assert_eq!(config.analyzers.len(), 1);
        assert_eq!(config.ranker.as_ref().unwrap().method, "bm25");
        assert_eq!(config.ranker.as_ref().unwrap().params.k1, Some(1.5));
    }

    #[test]
    fn builds_ranker_with_feedback_sub_table() {
        let toml_text = r#"
            prefix = "."
            dataset = "toy"
            corpus = "docs.txt"
            index = "idx"

            [ranker]
            method = "bm25"

            [ranker.feedback]
            alpha = 1.0
            beta = 0.5
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        let ranker = config.build_ranker().unwrap();
        assert!(matches!(ranker, Ranker::Rocchio { .. }));
    }

    #[test]
    fn missing_ranker_table_is_a_config_error() {
        let toml_text = r#"
            prefix = "."
            dataset = "toy"
            corpus = "docs.txt"
            index = "idx"
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert!(config.build_ranker().is_err());
    }
}
