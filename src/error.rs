//! Crate-wide error type.

use std::fmt;
use std::path::PathBuf;

/// Errors surfaced by the indexing and retrieval core.
///
/// Lookup failures that are expected control flow (a term absent from the
/// vocabulary, a metadata field not yet requested) are represented as
/// `Option`, not as a `MetaError` variant -- see `vocabulary_map::find` and
/// `Metadata::get`.
#[derive(Debug)]
pub enum MetaError {
    /// Missing or malformed configuration key.
    Config(String),
    /// Unreadable corpus, or a malformed line in the corpus file list.
    Corpus(String),
    /// File open / read / write / mmap / rename failure.
    Io(std::io::Error),
    /// On-disk structure violates an invariant (e.g. a record larger than
    /// one vocabulary_map block).
    IndexFormat(String),
    /// `metadata.get::<T>(name)` where `name` is declared with a different
    /// type than `T`.
    TypeMismatch { field: String, expected: &'static str },
    /// `metadata.get::<T>(name)` where `name` is not in the schema.
    UnknownField(String),
    /// Malformed query or invalid ranker parameter (a negative smoothing
    /// constant, for instance). A zero-length query is *not* this error --
    /// it simply produces an empty result.
    Ranker(String),
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::Config(msg) => write!(f, "configuration error: {msg}"),
            MetaError::Corpus(msg) => write!(f, "corpus error: {msg}"),
            MetaError::Io(err) => write!(f, "I/O error: {err}"),
            MetaError::IndexFormat(msg) => write!(f, "index format error: {msg}"),
            MetaError::TypeMismatch { field, expected } => {
                write!(f, "metadata field \"{field}\" is not of type {expected}")
            }
            MetaError::UnknownField(name) => {
                write!(f, "metadata column \"{name}\" not found")
            }
            MetaError::Ranker(msg) => write!(f, "ranker error: {msg}"),
        }
    }
}

impl std::error::Error for MetaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetaError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MetaError {
    fn from(err: std::io::Error) -> Self {
        MetaError::Io(err)
    }
}

impl From<toml::de::Error> for MetaError {
    fn from(err: toml::de::Error) -> Self {
        MetaError::Config(err.to_string())
    }
}

impl MetaError {
    /// Convenience constructor for I/O errors that should name the
    /// offending path.
    pub fn io_error(path: &PathBuf, err: std::io::Error) -> MetaError {
        MetaError::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;
