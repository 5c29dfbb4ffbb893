//! Corpus iteration: turns a configured corpus spec into a stream of
//! [`Document`]s for the construction driver (§4.12).
//!
//! Two concrete corpus readers are provided, grounded on
//! `src/corpus/file_corpus.cpp` and `src/corpus/gz_corpus.cpp`: `FileCorpus`
//! reads a doc-list file of `<label> <relative-path>` lines, and
//! `LineCorpus` treats one line of a single text file as one document (with
//! an optional parallel labels file), matching `gz_corpus`'s streaming
//! `class_stream_`/`corpus_stream_` pair minus the gzip layer.

pub mod document;

pub use document::{DocContent, Document};

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::MetaError;
use crate::types::{ClassLabel, DocId, MetadataFieldType, MetadataValue};

const NO_LABEL: &str = "[none]";

/// Source of documents during index construction.
pub trait Corpus {
    fn has_next(&self) -> bool;
    fn next(&mut self) -> Result<Document, MetaError>;
    fn size(&self) -> u64;
    fn encoding(&self) -> &str;
    fn store_full_text(&self) -> bool;
    /// Metadata schema contributed by this corpus, in the column order it
    /// will populate `Document::metadata`.
    fn schema(&self) -> Vec<(String, MetadataFieldType)>;
}

fn count_lines(path: &Path) -> Result<u64, MetaError> {
    let file = File::open(path).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
    Ok(BufReader::new(file).lines().count() as u64)
}

fn open_lines(path: &Path) -> Result<Lines<BufReader<File>>, MetaError> {
    let file = File::open(path).map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?;
    Ok(BufReader::new(file).lines())
}

fn read_line(
    path: &Path,
    lines: &mut Lines<BufReader<File>>,
) -> Result<Option<String>, MetaError> {
    match lines.next() {
        Some(line) => Ok(Some(
            line.map_err(|e| MetaError::io_error(&path.to_path_buf(), e))?,
        )),
        None => Ok(None),
    }
}

/// One document per line of a single text file, with an optional parallel
/// file of one class label per line (default `[none]`).
pub struct LineCorpus {
    text_path: PathBuf,
    text_lines: Lines<BufReader<File>>,
    label_path: Option<PathBuf>,
    label_lines: Option<Lines<BufReader<File>>>,
    encoding: String,
    store_full_text: bool,
    cur: u64,
    size: u64,
}

impl LineCorpus {
    pub fn open(
        text_path: impl Into<PathBuf>,
        label_path: Option<PathBuf>,
        encoding: impl Into<String>,
        store_full_text: bool,
    ) -> Result<Self, MetaError> {
        let text_path = text_path.into();
        let size = count_lines(&text_path)?;
        let text_lines = open_lines(&text_path)?;
        let label_lines = label_path.as_deref().map(open_lines).transpose()?;
        Ok(LineCorpus {
            text_path,
            text_lines,
            label_path,
            label_lines,
            encoding: encoding.into(),
            store_full_text,
            cur: 0,
            size,
        })
    }
}

impl Corpus for LineCorpus {
    fn has_next(&self) -> bool {
        self.cur < self.size
    }

    fn next(&mut self) -> Result<Document, MetaError> {
        let line = read_line(&self.text_path, &mut self.text_lines)?
            .ok_or_else(|| MetaError::Corpus("line corpus exhausted".to_owned()))?;

        let label = match (&self.label_path, &mut self.label_lines) {
            (Some(path), Some(lines)) => {
                read_line(path, lines)?.map_or_else(|| ClassLabel::from(NO_LABEL), ClassLabel::from)
            }
            _ => ClassLabel::from(NO_LABEL),
        };

        let doc_id = DocId::new(self.cur);
        self.cur += 1;

        let mut doc =
            Document::new(doc_id, Some(label), self.encoding.clone()).with_content(DocContent::Inline(line));
        if self.store_full_text {
            let text = doc.text().map_err(|e| MetaError::io_error(&self.text_path, e))?;
            doc.push_metadata("content", MetadataValue::String(text));
        }
        Ok(doc)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn encoding(&self) -> &str {
        &self.encoding
    }

    fn store_full_text(&self) -> bool {
        self.store_full_text
    }

    fn schema(&self) -> Vec<(String, MetadataFieldType)> {
        let mut schema = Vec::new();
        if self.store_full_text {
            schema.push(("content".to_owned(), MetadataFieldType::String));
        }
        schema
    }
}

/// A doc-list file of `<label> <relative-path>` lines; document text is
/// read from `prefix/<relative-path>` on demand.
pub struct FileCorpus {
    prefix: PathBuf,
    docs: Vec<(PathBuf, ClassLabel)>,
    cur: usize,
    encoding: String,
    store_full_text: bool,
}

impl FileCorpus {
    pub fn open(
        prefix: impl Into<PathBuf>,
        doc_list: impl AsRef<Path>,
        encoding: impl Into<String>,
        store_full_text: bool,
    ) -> Result<Self, MetaError> {
        let doc_list = doc_list.as_ref();
        let contents = std::fs::read_to_string(doc_list)
            .map_err(|e| MetaError::io_error(&doc_list.to_path_buf(), e))?;

        let mut docs = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            if line.is_empty() {
                return Err(MetaError::Corpus(format!(
                    "empty line in corpus list: line #{}",
                    idx + 1
                )));
            }
            let (label, path) = line.split_once(' ').ok_or_else(|| {
                MetaError::Corpus(
                    "document list needs class label prefix (add [none] if there are no labels)"
                        .to_owned(),
                )
            })?;
            docs.push((PathBuf::from(path), ClassLabel::from(label)));
        }

        Ok(FileCorpus {
            prefix: prefix.into(),
            docs,
            cur: 0,
            encoding: encoding.into(),
            store_full_text,
        })
    }
}

impl Corpus for FileCorpus {
    fn has_next(&self) -> bool {
        self.cur < self.docs.len()
    }

    fn next(&mut self) -> Result<Document, MetaError> {
        let (rel_path, label) = self
            .docs
            .get(self.cur)
            .ok_or_else(|| MetaError::Corpus("file corpus exhausted".to_owned()))?
            .clone();
        let full_path = self.prefix.join(&rel_path);
        if !full_path.exists() {
            return Err(MetaError::Corpus(format!(
                "file \"{}\" does not exist",
                full_path.display()
            )));
        }

        let doc_id = DocId::new(self.cur as u64);
        self.cur += 1;

        let mut doc = Document::new(doc_id, Some(label), self.encoding.clone())
            .with_content(DocContent::File(full_path.clone()));

        if self.store_full_text {
            let text = doc
                .text()
                .map_err(|e| MetaError::io_error(&full_path, e))?;
            doc.push_metadata("content", MetadataValue::String(text));
        }
        doc.push_metadata(
            "path",
            MetadataValue::String(full_path.display().to_string()),
        );
        Ok(doc)
    }

    fn size(&self) -> u64 {
        self.docs.len() as u64
    }

    fn encoding(&self) -> &str {
        &self.encoding
    }

    fn store_full_text(&self) -> bool {
        self.store_full_text
    }

    fn schema(&self) -> Vec<(String, MetadataFieldType)> {
        let mut schema = Vec::new();
        if self.store_full_text {
            schema.push(("content".to_owned(), MetadataFieldType::String));
        }
        schema.push(("path".to_owned(), MetadataFieldType::String));
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn line_corpus_reads_docs_and_default_labels() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cat dog").unwrap();
        writeln!(file, "fish bird").unwrap();

        let mut corpus = LineCorpus::open(file.path(), None, "utf-8", false).unwrap();
        assert_eq!(corpus.size(), 2);

        let d0 = corpus.next().unwrap();
        assert_eq!(d0.doc_id, DocId::new(0));
        assert_eq!(d0.class_label, Some(ClassLabel::from(NO_LABEL)));
        assert_eq!(d0.text().unwrap(), "cat dog");

        let d1 = corpus.next().unwrap();
        assert_eq!(d1.doc_id, DocId::new(1));
        assert!(!corpus.has_next());
    }

    #[test]
    fn line_corpus_reads_parallel_labels() {
        let mut text = tempfile::NamedTempFile::new().unwrap();
        writeln!(text, "cat dog").unwrap();
        writeln!(text, "fish bird").unwrap();
        let mut labels = tempfile::NamedTempFile::new().unwrap();
        writeln!(labels, "positive").unwrap();
        writeln!(labels, "negative").unwrap();

        let mut corpus =
            LineCorpus::open(text.path(), Some(labels.path().to_path_buf()), "utf-8", false)
                .unwrap();
        let d0 = corpus.next().unwrap();
        assert_eq!(d0.class_label, Some(ClassLabel::from("positive")));
        let d1 = corpus.next().unwrap();
        assert_eq!(d1.class_label, Some(ClassLabel::from("negative")));
    }

    #[test]
    fn file_corpus_reads_label_and_path_per_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello world").unwrap();
        let list_path = dir.path().join("list.txt");
        std::fs::write(&list_path, "pos a.txt\n").unwrap();

        let mut corpus = FileCorpus::open(dir.path(), &list_path, "utf-8", false).unwrap();
        assert_eq!(corpus.size(), 1);
        let doc = corpus.next().unwrap();
        assert_eq!(doc.class_label, Some(ClassLabel::from("pos")));
        assert_eq!(doc.text().unwrap(), "hello world");
        assert_eq!(
            doc.metadata,
            vec![(
                "path".to_owned(),
                MetadataValue::String(dir.path().join("a.txt").display().to_string())
            )]
        );
    }

    #[test]
    fn file_corpus_rejects_missing_label_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let list_path = dir.path().join("list.txt");
        std::fs::write(&list_path, "a.txt\n").unwrap();
        assert!(FileCorpus::open(dir.path(), &list_path, "utf-8", false).is_err());
    }
}
