//! Drops tokens with no visible (non-whitespace) characters, collapsing
//! whitespace runs emitted by `WhitespaceTokenizer` that survive downstream
//! of filters which don't themselves consume them.

use super::{whitespace_tokenizer::is_whitespace_token, EmptyStreamError, TokenStream};

#[derive(Clone)]
pub struct BlankFilter {
    source: Box<dyn TokenStream>,
    buffered: Option<String>,
}

impl BlankFilter {
    pub fn new(source: Box<dyn TokenStream>) -> Self {
        let mut filter = BlankFilter {
            source,
            buffered: None,
        };
        filter.advance();
        filter
    }

    fn passes(token: &str) -> bool {
        !token.is_empty() && !is_whitespace_token(token)
    }

    fn advance(&mut self) {
        self.buffered = None;
        while self.source.has_next() {
            match self.source.next() {
                Ok(token) if Self::passes(&token) => {
                    self.buffered = Some(token);
                    return;
                }
                Ok(_) => continue,
                Err(_) => return,
            }
        }
    }
}

impl TokenStream for BlankFilter {
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

    fn drain(mut filter: BlankFilter) -> Vec<String> {
        let mut out = Vec::new();
        while filter.has_next() {
            out.push(filter.next().unwrap());
        }
        out
    }

    #[test]
    fn drops_whitespace_only_tokens() {
        let tokens: VecDeque<String> = ["a", "  ", "bb", "\t", "ccc"]
            .into_iter()
            .map(String::from)
            .collect();
        let source: Box<dyn TokenStream> = Box::new(Fixed(tokens));
        let filter = BlankFilter::new(source);
        assert_eq!(drain(filter), vec!["a", "bb", "ccc"]);
    }

    #[test]
    fn all_blank_leaves_empty() {
        let tokens: VecDeque<String> = [" ", "\t\t", ""].into_iter().map(String::from).collect();
        let source: Box<dyn TokenStream> = Box::new(Fixed(tokens));
        let mut filter = BlankFilter::new(source);
        assert!(!filter.has_next());
        assert!(filter.next().is_err());
    }
}
