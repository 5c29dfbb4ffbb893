//! Drops `<s> </s>` pairs with nothing between them, which the sentence
//! boundary filter and upstream trimming can otherwise leave behind.

use super::{EmptyStreamError, TokenStream, SENTENCE_END, SENTENCE_START};

#[derive(Clone)]
pub struct EmptySentenceFilter {
    source: Box<dyn TokenStream>,
    /// One-token lookahead buffer over `source`, needed to peek past a
    /// `<s>` without losing it if the peek doesn't turn out to be `</s>`.
    peeked: Option<String>,
    buffered: Option<String>,
}

impl EmptySentenceFilter {
    pub fn new(source: Box<dyn TokenStream>) -> Self {
        let mut filter = EmptySentenceFilter {
            source,
            peeked: None,
            buffered: None,
        };
        filter.advance();
        filter
    }

    fn pull_raw(&mut self) -> Option<String> {
        if let Some(token) = self.peeked.take() {
            return Some(token);
        }
        if self.source.has_next() {
            self.source.next().ok()
        } else {
            None
        }
    }

    fn peek_raw(&mut self) -> Option<&str> {
        if self.peeked.is_none() {
            self.peeked = if self.source.has_next() {
                self.source.next().ok()
            } else {
                None
            };
        }
        self.peeked.as_deref()
    }

    fn advance(&mut self) {
        self.buffered = None;
        loop {
            let token = match self.pull_raw() {
                Some(t) => t,
                None => return,
            };
            if token == SENTENCE_START && self.peek_raw() == Some(SENTENCE_END) {
                self.pull_raw(); // consume the matching </s>
                continue;
            }
            self.buffered = Some(token);
            return;
        }
    }
}

impl TokenStream for EmptySentenceFilter {
    fn set_content(&mut self, content: String) {
        self.source.set_content(content);
        self.peeked = None;
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
