//! Base tokenizer: alternates between runs of whitespace and runs of
//! non-whitespace characters, emitting each run as one token. Whitespace
//! runs are kept as tokens (rather than discarded) so that downstream
//! filters such as `EnglishNormalizer` can collapse or inspect them.

use std::collections::VecDeque;

use super::{EmptyStreamError, TokenStream};

#[derive(Clone, Default)]
pub struct WhitespaceTokenizer {
    tokens: VecDeque<String>,
}

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        WhitespaceTokenizer::default()
    }

    fn tokenize(content: &str) -> VecDeque<String> {
        let mut tokens = VecDeque::new();
        let chars: Vec<char> = content.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let start = i;
            let is_ws = chars[i].is_whitespace();
            while i < chars.len() && chars[i].is_whitespace() == is_ws {
                i += 1;
            }
            tokens.push_back(chars[start..i].iter().collect());
        }
        tokens
    }
}

impl TokenStream for WhitespaceTokenizer {
    fn set_content(&mut self, content: String) {
        self.tokens = Self::tokenize(&content);
    }

    fn next(&mut self) -> Result<String, EmptyStreamError> {
        self.tokens.pop_front().ok_or(EmptyStreamError)
    }

    fn has_next(&self) -> bool {
        !self.tokens.is_empty()
    }
}

/// True iff `token` consists entirely of whitespace characters.
pub fn is_whitespace_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_whitespace)
}
