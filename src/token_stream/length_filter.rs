//! Retains only tokens within `[min, max]` Unicode-codepoint length,
//! inclusive. Sentence boundary markers bypass the length check.
//!
//! Grounded on `include/meta/analyzers/filters/length_filter.h`: the
//! reference implementation buffers one lookahead token (`token_`) so that
//! `has_next()` accurately reports whether a passing token exists, rather
//! than merely whether the upstream source has more tokens to try.

use super::{EmptyStreamError, TokenStream, SENTENCE_END, SENTENCE_START};

#[derive(Clone)]
pub struct LengthFilter {
    source: Box<dyn TokenStream>,
    min: usize,
    max: usize,
    buffered: Option<String>,
}

impl LengthFilter {
    pub fn new(source: Box<dyn TokenStream>, min: usize, max: usize) -> Self {
        let mut filter = LengthFilter {
            source,
            min,
            max,
            buffered: None,
        };
        filter.advance();
        filter
    }

    fn passes(&self, token: &str) -> bool {
        if token == SENTENCE_START || token == SENTENCE_END {
            return true;
        }
        let len = token.chars().count();
        len >= self.min && len <= self.max
    }

    fn advance(&mut self) {
        self.buffered = None;
        while self.source.has_next() {
            match self.source.next() {
                Ok(token) if self.passes(&token) => {
                    self.buffered = Some(token);
                    return;
                }
                Ok(_) => continue,
                Err(_) => return,
            }
        }
    }
}

impl TokenStream for LengthFilter {
    fn set_content(&mut self, content: String) {
        self.source.set_content(content);
        self.advance();
    }

    fn next(&mut self) -> Result<String, EmptyStreamError> {
        let token = self.buffered.take().ok_or(EmptyStreamError)?;
        self.advance();
        Ok(token)
    }

    fn has_next(&self) -> bool {
        self.buffered.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Clone, Default)]
    struct Fixed(VecDeque<String>);
    impl TokenStream for Fixed {
        fn set_content(&mut self, _content: String) {}
        fn next(&mut self) -> Result<String, EmptyStreamError> {
            self.0.pop_front().ok_or(EmptyStreamError)
        }
        fn has_next(&self) -> bool {
            !self.0.is_empty()
        }
    }

    fn drain(mut filter: LengthFilter) -> Vec<String> {
        let mut out = Vec::new();
        while filter.has_next() {
            out.push(filter.next().unwrap());
        }
        out
    }

    #[test]
    fn bypasses_sentence_markers() {
        let tokens: VecDeque<String> = ["<s>", "a", "bb", "ccc", "dddd", "</s>"]
            .into_iter()
            .map(String::from)
            .collect();
        let source: Box<dyn TokenStream> = Box::new(Fixed(tokens));
        let filter = LengthFilter::new(source, 2, 3);
        assert_eq!(drain(filter), vec!["<s>", "bb", "ccc", "</s>"]);
    }

    #[test]
    fn all_filtered_leaves_empty() {
        let tokens: VecDeque<String> = ["a", "b"].into_iter().map(String::from).collect();
        let source: Box<dyn TokenStream> = Box::new(Fixed(tokens));
        let mut filter = LengthFilter::new(source, 5, 10);
        assert!(!filter.has_next());
        assert!(filter.next().is_err());
    }
}
