//! Core data models shared by the segmenter, the search engine, and the
//! application layer.
//!
//! [`Document`] and [`Sentence`] are built once per uploaded file and are
//! read-only afterwards. [`Keyword`], [`Match`], [`ContextWindow`], and
//! [`Snippet`] are recomputed for every search request.

use serde::Serialize;

use crate::normalize::fold;
use crate::segment::{normalize_text, segment};

/// A segmented document, identified by its file name.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// File name as uploaded.
    pub name: String,
    /// Hex SHA-256 of the bytes the text was extracted from.
    pub content_hash: String,
    /// Size of the uploaded file in bytes, when known.
    pub size: u64,
    /// Extracted text after line-ending and blank-line normalization.
    /// Sentence offsets point into this string.
    #[serde(skip_serializing)]
    pub text: String,
    /// Sentences in reading order.
    #[serde(skip_serializing)]
    pub sentences: Vec<Sentence>,
}

impl Document {
    /// Normalize and segment extracted text into a new document.
    pub fn from_text(name: &str, content_hash: &str, raw_text: &str) -> Self {
        let text = normalize_text(raw_text);
        let sentences = segment(&text);
        Self {
            name: name.to_string(),
            content_hash: content_hash.to_string(),
            size: 0,
            text,
            sentences,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// `true` when segmentation produced nothing searchable.
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// A sentence-like span of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    /// Ordinal position within the document, starting at 0.
    pub index: usize,
    /// Byte offset of the first character in the normalized document text.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Display text. Paragraph breaks inside the sentence are kept as `\n`.
    pub text: String,
    /// Folded comparison copy of `text` (see [`crate::normalize::fold`]).
    #[serde(skip_serializing)]
    pub folded: String,
}

impl Sentence {
    pub fn new(index: usize, start: usize, end: usize, text: &str) -> Self {
        Self {
            index,
            start,
            end,
            text: text.to_string(),
            folded: fold(text),
        }
    }
}

/// A user-supplied search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyword {
    /// Spelling as typed (trimmed), used for display.
    pub text: String,
    /// Folded form used for matching.
    #[serde(skip_serializing)]
    pub folded: String,
}

impl Keyword {
    pub fn new(text: &str) -> Self {
        let text = text.trim();
        Self {
            text: text.to_string(),
            folded: fold(text),
        }
    }
}

/// A sentence that contains at least one keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub sentence_index: usize,
}

/// Half-open interval `[start, end)` of sentence indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    pub start: usize,
    pub end: usize,
}

/// Byte range of a highlighted keyword occurrence in [`Snippet::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
}

/// A rendered excerpt of one merged context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    /// Name of the source document.
    pub document_name: String,
    /// Sentence range this snippet covers.
    pub window: ContextWindow,
    /// Joined, whitespace-collapsed snippet text without markers.
    pub text: String,
    /// Non-overlapping highlight ranges, sorted by position.
    pub highlights: Vec<Highlight>,
}
