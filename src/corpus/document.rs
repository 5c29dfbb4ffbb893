//! A single document as seen during index construction: either inline text
//! already in memory, or a path to a file on disk. Transient -- it exists
//! only long enough to be tokenized and folded into the metadata writer and
//! postings buffer.
//!
//! Grounded on `include/meta/corpus/document.h`'s `document` class (doc_id,
//! class_label, content/path union, per-field metadata accumulated during
//! corpus iteration).

use std::path::PathBuf;

use crate::types::{ClassLabel, DocId, MetadataValue};

/// Where a document's text lives.
#[derive(Clone, Debug, PartialEq)]
pub enum DocContent {
    Inline(String),
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct Document {
    pub doc_id: DocId,
    pub class_label: Option<ClassLabel>,
    pub content: DocContent,
    pub encoding: String,
    /// Metadata columns gathered for this document (schema order), e.g.
    /// `path`, `content` (if `store-full-text`), corpus-supplied columns.
    pub metadata: Vec<(String, MetadataValue)>,
}

impl Document {
    pub fn new(doc_id: DocId, class_label: Option<ClassLabel>, encoding: impl Into<String>) -> Self {
        Document {
            doc_id,
            class_label,
            content: DocContent::Inline(String::new()),
            encoding: encoding.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: DocContent) -> Self {
        self.content = content;
        self
    }

    pub fn push_metadata(&mut self, name: impl Into<String>, value: MetadataValue) {
        self.metadata.push((name.into(), value));
    }

    /// Resolves `content` to an owned string, reading the file from disk if
    /// this document wraps a path rather than inline text.
    pub fn text(&self) -> std::io::Result<String> {
        match &self.content {
            DocContent::Inline(s) => Ok(s.clone()),
            DocContent::File(path) => std::fs::read_to_string(path),
        }
    }
}
