//! Normalizes English-language tokens: collapses whitespace runs to a
//! single `" "` token, and splits punctuation away from word characters
//! using a handful of quoting/hyphenation heuristics.
//!
//! Ported from `include/meta/analyzers/filters/english_normalizer.h` /
//! `english_normalizer.cpp`, preserving its exact index arithmetic
//! (including the em-dash branch of `word()`, which intentionally keeps
//! scanning from the pre-dash index after splitting out a dash run).

use std::collections::VecDeque;

use super::{EmptyStreamError, TokenStream};

#[derive(Clone)]
pub struct EnglishNormalizer {
    source: Box<dyn TokenStream>,
    tokens: VecDeque<String>,
}

impl EnglishNormalizer {
    pub fn new(source: Box<dyn TokenStream>) -> Self {
        EnglishNormalizer {
            source,
            tokens: VecDeque::new(),
        }
    }

    fn is_whitespace(token: &str) -> bool {
        !token.is_empty() && token.chars().all(char::is_whitespace)
    }

    fn is_quote(c: char) -> bool {
        c == '\'' || c == '`'
    }

    fn current_token(&mut self) -> String {
        self.tokens.pop_front().expect("tokens checked non-empty")
    }

    fn starting_quotes(&mut self, start: usize, token: &[char]) -> usize {
        if token[start] == '"' {
            self.tokens.push_back("``".to_owned());
            return start + 1;
        }
        if start + 1 < token.len() && Self::is_quote(token[start]) && Self::is_quote(token[start + 1])
        {
            self.tokens.push_back("``".to_owned());
            return start + 2;
        }
        start
    }

    fn strip_dashes(&mut self, start: usize, token: &[char]) -> usize {
        let mut idx = start + 1;
        while idx < token.len() && token[idx] == '-' {
            idx += 1;
        }
        self.tokens.push_back(token[start..idx].iter().collect());
        idx
    }

    fn word(&mut self, start: usize, token: &[char]) -> usize {
        let mut start = start;
        if token[start] == '-' && start + 1 < token.len() && token[start + 1] == '-' {
            start = self.strip_dashes(start, token);
        }

        let mut idx = start + 1;
        while idx < token.len() {
            if token[idx] == '-' && idx + 1 < token.len() && token[idx + 1] == '-' {
                self.tokens.push_back(token[start..idx].iter().collect());
                start = self.strip_dashes(idx, token);
            }

            if token[idx].is_ascii_punctuation() && token[idx] != '-' {
                break;
            }
            idx += 1;
        }

        self.tokens.push_back(token[start..idx].iter().collect());
        idx
    }

    fn parse_token(&mut self, token: &str) {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 2 {
            self.tokens.push_back(token.to_owned());
            return;
        }

        let mut end = chars.len();
        let mut end_quotes = false;
        if chars[end - 1] == '"' {
            end -= 1;
            end_quotes = true;
        } else if Self::is_quote(chars[end - 1]) && Self::is_quote(chars[end - 2]) {
            end -= 2;
            end_quotes = true;
        }

        let mut idx = self.starting_quotes(0, &chars);

        while idx < end && !chars[idx].is_ascii_alphanumeric() {
            self.tokens.push_back(chars[idx].to_string());
            idx += 1;
        }

        while idx < end {
            idx = self.word(idx, &chars);
        }

        if end_quotes {
            self.tokens.push_back("''".to_owned());
        }
    }
}

impl TokenStream for EnglishNormalizer {
    fn set_content(&mut self, content: String) {
        self.tokens.clear();
        self.source.set_content(content);
    }

    fn next(&mut self) -> Result<String, EmptyStreamError> {
        if !self.tokens.is_empty() {
            return Ok(self.current_token());
        }

        if !self.source.has_next() {
            return Err(EmptyStreamError);
        }

        let mut token = self.source.next()?;
        if Self::is_whitespace(&token) {
            while Self::is_whitespace(&token) && self.source.has_next() {
                token = self.source.next()?;
            }
            if !Self::is_whitespace(&token) {
                self.parse_token(&token);
            }
            return Ok(" ".to_owned());
        }

        self.parse_token(&token);
        Ok(self.current_token())
    }

    fn has_next(&self) -> bool {
        !self.tokens.is_empty() || self.source.has_next()
    }
}
