//! Composable token-stream chain: a tokenizer plus a linked list of filters.
//!
//! Mirrors the `util::clonable<token_stream, Derived>` CRTP mixin attested
//! across every filter header in the original source (`english_normalizer.h`,
//! `length_filter.h`, ...): each filter owns a boxed inner source and must be
//! deep-cloneable so analyzers can be replicated across worker threads
//! (`std::thread`/`rayon` workers each get their own chain). The idiomatic
//! Rust substitute for the CRTP clone mixin is a small object-safe
//! `CloneTokenStream` helper trait blanket-implemented for any `Clone`
//! token stream.

pub mod blank_filter;
pub mod empty_sentence_filter;
pub mod english_normalizer;
pub mod length_filter;
pub mod list_filter;
pub mod sentence_boundary;
pub mod whitespace_tokenizer;

pub use blank_filter::BlankFilter;
pub use empty_sentence_filter::EmptySentenceFilter;
pub use english_normalizer::EnglishNormalizer;
pub use length_filter::LengthFilter;
pub use list_filter::ListFilter;
pub use sentence_boundary::SentenceBoundaryFilter;
pub use whitespace_tokenizer::WhitespaceTokenizer;

/// Sentinel emitted by the sentence-boundary filter to mark sentence start.
pub const SENTENCE_START: &str = "<s>";
/// Sentinel emitted by the sentence-boundary filter to mark sentence end.
pub const SENTENCE_END: &str = "</s>";

/// Error produced by a token stream positioned past its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyStreamError;

impl std::fmt::Display for EmptyStreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "next() called on an exhausted token_stream")
    }
}

impl std::error::Error for EmptyStreamError {}

/// A lazy sequence of tokens produced from a text buffer.
pub trait TokenStream: CloneTokenStream {
    /// Resets state to the beginning of `content`.
    fn set_content(&mut self, content: String);

    /// Returns the next token. Returns `Err(EmptyStreamError)` if
    /// `!has_next()`.
    fn next(&mut self) -> Result<String, EmptyStreamError>;

    /// True iff `next()` may be called.
    fn has_next(&self) -> bool;
}

/// Object-safe clone-through-`Box` helper, substituting for the source's
/// CRTP `clonable` mixin.
pub trait CloneTokenStream {
    fn clone_box(&self) -> Box<dyn TokenStream>;
}

impl<T> CloneTokenStream for T
where
    T: 'static + TokenStream + Clone,
{
    fn clone_box(&self) -> Box<dyn TokenStream> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn TokenStream> {
    fn clone(&self) -> Box<dyn TokenStream> {
        self.clone_box()
    }
}

/// Drains a token stream into a `Vec<String>`, used by tests and by the
/// analyzer's windowing loop.
pub fn collect(mut stream: Box<dyn TokenStream>, content: &str) -> Vec<String> {
    stream.set_content(content.to_owned());
    let mut tokens = Vec::new();
    while stream.has_next() {
        match stream.next() {
            Ok(tok) => tokens.push(tok),
            Err(_) => break,
        }
    }
    tokens
}
