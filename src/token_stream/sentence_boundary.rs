//! Inserts `<s>` / `</s>` sentence boundary markers into an already
//! tokenized-and-normalized stream, using heuristic punctuation and
//! start/end exception word lists.
//!
//! Ported from `include/meta/analyzers/filters/sentence_boundary.h` /
//! `sentence_boundary.cpp`. The heuristic tables are process-wide state,
//! loaded once via [`load_heuristics`] before any filter is constructed --
//! mirrored here with a [`OnceLock`] instead of the source's static
//! `heuristics_loaded` flag plus global `unordered_set`s.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::MetaError;

use super::{EmptyStreamError, TokenStream, SENTENCE_END, SENTENCE_START};

struct Heuristics {
    punc: HashSet<String>,
    start_exceptions: HashSet<String>,
    end_exceptions: HashSet<String>,
}

static HEURISTICS: OnceLock<Heuristics> = OnceLock::new();

fn read_lines(path: impl AsRef<Path>) -> Result<HashSet<String>, MetaError> {
    let contents = fs::read_to_string(path.as_ref())
        .map_err(|e| MetaError::io_error(&path.as_ref().to_path_buf(), e))?;
    Ok(contents.lines().map(str::to_owned).collect())
}

/// Loads the sentence-boundary heuristic tables. A no-op if heuristics have
/// already been loaded in this process -- matching the source's
/// init-once contract.
pub fn load_heuristics(
    punctuation: impl AsRef<Path>,
    start_exceptions: impl AsRef<Path>,
    end_exceptions: impl AsRef<Path>,
) -> Result<(), MetaError> {
    if HEURISTICS.get().is_some() {
        return Ok(());
    }
    let heuristics = Heuristics {
        punc: read_lines(punctuation)?,
        start_exceptions: read_lines(start_exceptions)?,
        end_exceptions: read_lines(end_exceptions)?,
    };
    let _ = HEURISTICS.set(heuristics);
    Ok(())
}

#[derive(Clone)]
pub struct SentenceBoundaryFilter {
    source: Box<dyn TokenStream>,
    tokens: VecDeque<String>,
    prev: Option<String>,
}

impl SentenceBoundaryFilter {
    pub fn new(source: Box<dyn TokenStream>) -> Result<Self, MetaError> {
        if HEURISTICS.get().is_none() {
            return Err(MetaError::Config(
                "sentence boundary heuristics must be pre-loaded".to_owned(),
            ));
        }
        let mut tokens = VecDeque::new();
        tokens.push_back(SENTENCE_START.to_owned());
        Ok(SentenceBoundaryFilter {
            source,
            tokens,
            prev: None,
        })
    }

    fn heuristics() -> &'static Heuristics {
        HEURISTICS.get().expect("checked by new()")
    }

    fn possible_punc(token: &str) -> bool {
        Self::heuristics().punc.contains(token)
    }

    fn possible_end(token: &str) -> bool {
        !Self::heuristics().end_exceptions.contains(token) && !token.starts_with('.')
    }

    fn possible_start(token: &str) -> bool {
        !Self::heuristics().start_exceptions.contains(token)
    }

    fn current_token(&mut self) -> String {
        let token = self.tokens.pop_front().expect("tokens checked non-empty");
        self.prev = Some(token.clone());
        token
    }
}

impl TokenStream for SentenceBoundaryFilter {
    fn set_content(&mut self, content: String) {
        self.tokens.clear();
        self.tokens.push_back(SENTENCE_START.to_owned());
        self.prev = None;
        self.source.set_content(content);
    }

    fn next(&mut self) -> Result<String, EmptyStreamError> {
        if self.tokens.is_empty() {
            if !self.source.has_next() {
                return Err(EmptyStreamError);
            }
            self.tokens.push_back(self.source.next()?);
        }

        let prev_blocks = self
            .prev
            .as_deref()
            .is_some_and(|p| !Self::possible_end(p));
        if !Self::possible_punc(&self.tokens[0]) || prev_blocks {
            return Ok(self.current_token());
        }

        if !self.source.has_next() {
            self.tokens.push_back(SENTENCE_END.to_owned());
            return Ok(self.current_token());
        }

        let token = self.source.next()?;
        if token != " " {
            self.tokens.push_back(token);
            return Ok(self.current_token());
        }

        if !self.source.has_next() {
            self.tokens.push_back(SENTENCE_END.to_owned());
            return Ok(self.current_token());
        }

        let start_token = self.source.next()?;
        if !Self::possible_start(&start_token) {
            self.tokens.push_back(token);
            self.tokens.push_back(start_token);
            return Ok(self.current_token());
        }

        self.tokens.push_back(SENTENCE_END.to_owned());
        self.tokens.push_back(token);
        self.tokens.push_back(SENTENCE_START.to_owned());
        self.tokens.push_back(start_token);
        Ok(self.current_token())
    }

    fn has_next(&self) -> bool {
        !self.tokens.is_empty() || self.source.has_next()
    }
}
