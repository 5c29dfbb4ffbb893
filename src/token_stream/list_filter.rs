//! Accept-list or reject-list filter: drops (or keeps) tokens found in a
//! word list loaded from a file at construction time.
//!
//! Grounded on `include/meta/analyzers/filters/list_filter.h` /
//! `list_filter.cpp`: one word per line, reject by default.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::MetaError;

use super::{EmptyStreamError, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    Accept,
    Reject,
}

#[derive(Clone)]
pub struct ListFilter {
    source: Box<dyn TokenStream>,
    list: HashSet<String>,
    method: ListMethod,
    buffered: Option<String>,
}

impl ListFilter {
    pub fn new(
        source: Box<dyn TokenStream>,
        filename: impl AsRef<Path>,
        method: ListMethod,
    ) -> Result<Self, MetaError> {
        let contents = fs::read_to_string(filename.as_ref())
            .map_err(|e| MetaError::io_error(&filename.as_ref().to_path_buf(), e))?;
        let list = contents.lines().map(str::to_owned).collect();
        let mut filter = ListFilter {
            source,
            list,
            method,
            buffered: None,
        };
        filter.advance();
        Ok(filter)
    }

    fn passes(&self, token: &str) -> bool {
        let found = self.list.contains(token);
        match self.method {
            ListMethod::Accept => found,
            ListMethod::Reject => !found,
        }
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

impl TokenStream for ListFilter {
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
