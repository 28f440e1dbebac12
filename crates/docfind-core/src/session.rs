//! Per-session document store.
//!
//! Documents are keyed by the SHA-256 of the bytes they were extracted from,
//! so uploading identical bytes again skips extraction and segmentation.
//! The store has no eviction; it grows until [`Session::clear`] is called.
//! Each interactive session owns one instance.

use sha2::{Digest, Sha256};

use crate::models::{Document, Keyword, Snippet};
use crate::search::{search_all, SearchParams};

/// Hex SHA-256 of raw file bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// What happened to a document offered to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Newly stored.
    Added,
    /// Stored, replacing an earlier document with the same name.
    Replaced,
    /// Identical bytes were already present; nothing was recomputed.
    Cached,
    /// Segmentation produced no sentences; the document was not stored.
    Empty,
}

/// In-memory set of searchable documents, in upload order.
#[derive(Debug, Default)]
pub struct Session {
    documents: Vec<Document>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for already-seen bytes without re-extracting.
    ///
    /// Returns `None` when no document with `hash` exists and the caller has
    /// to extract the file. When the bytes are known under another name, the
    /// segmented document is copied under `name`; if `name` held other
    /// bytes, the result is [`Admission::Replaced`].
    pub fn reuse(&mut self, name: &str, hash: &str) -> Option<Admission> {
        if self
            .documents
            .iter()
            .any(|d| d.name == name && d.content_hash == hash)
        {
            return Some(Admission::Cached);
        }
        let known = self.documents.iter().find(|d| d.content_hash == hash)?;
        let mut copy = known.clone();
        copy.name = name.to_string();
        match self.insert(copy) {
            Admission::Replaced => Some(Admission::Replaced),
            _ => Some(Admission::Cached),
        }
    }

    /// Store a freshly segmented document.
    ///
    /// Empty documents are rejected; a document with an existing name
    /// replaces the earlier one in place.
    pub fn insert(&mut self, document: Document) -> Admission {
        if document.is_empty() {
            return Admission::Empty;
        }
        match self.documents.iter_mut().find(|d| d.name == document.name) {
            Some(slot) => {
                *slot = document;
                Admission::Replaced
            }
            None => {
                self.documents.push(document);
                Admission::Added
            }
        }
    }

    /// Remove one document. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.name != name);
        self.documents.len() != before
    }

    /// Drop every document.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Search every stored document, in upload order.
    pub fn search(&self, keywords: &[Keyword], params: &SearchParams) -> Vec<Snippet> {
        search_all(&self.documents, keywords, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::parse_query;

    fn doc(name: &str, bytes: &[u8]) -> Document {
        let text = String::from_utf8_lossy(bytes);
        Document::from_text(name, &content_hash(bytes), &text)
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = content_hash(b"abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn identical_bytes_are_cached() {
        let mut s = Session::new();
        let bytes = b"Vay von. Khac.";
        assert_eq!(s.reuse("a.txt", &content_hash(bytes)), None);
        assert_eq!(s.insert(doc("a.txt", bytes)), Admission::Added);
        assert_eq!(
            s.reuse("a.txt", &content_hash(bytes)),
            Some(Admission::Cached)
        );
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn same_bytes_under_new_name_are_copied() {
        let mut s = Session::new();
        let bytes = b"Vay von. Khac.";
        s.insert(doc("a.txt", bytes));
        assert_eq!(
            s.reuse("b.txt", &content_hash(bytes)),
            Some(Admission::Cached)
        );
        assert_eq!(s.len(), 2);
        let copy = s.documents().iter().find(|d| d.name == "b.txt").unwrap();
        assert_eq!(copy.sentences.len(), 2);
    }

    #[test]
    fn known_bytes_over_existing_name_report_replaced() {
        let mut s = Session::new();
        s.insert(doc("a.txt", b"Old."));
        s.insert(doc("b.txt", b"New."));
        assert_eq!(
            s.reuse("a.txt", &content_hash(b"New.")),
            Some(Admission::Replaced)
        );
        assert_eq!(s.len(), 2);
        assert_eq!(s.documents()[0].name, "a.txt");
        assert_eq!(s.documents()[0].sentences[0].text, "New.");
    }

    #[test]
    fn same_name_new_bytes_replaces() {
        let mut s = Session::new();
        s.insert(doc("a.txt", b"Old text."));
        s.insert(doc("b.txt", b"Other."));
        assert_eq!(s.insert(doc("a.txt", b"New text.")), Admission::Replaced);
        assert_eq!(s.len(), 2);
        assert_eq!(s.documents()[0].name, "a.txt");
        assert_eq!(s.documents()[0].sentences[0].text, "New text.");
    }

    #[test]
    fn empty_documents_are_not_stored() {
        let mut s = Session::new();
        assert_eq!(s.insert(doc("blank.pdf", b"  \n ")), Admission::Empty);
        assert!(s.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut s = Session::new();
        s.insert(doc("a.txt", b"A."));
        s.insert(doc("b.txt", b"B."));
        assert!(s.remove("a.txt"));
        assert!(!s.remove("a.txt"));
        assert_eq!(s.len(), 1);
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn search_spans_documents() {
        let mut s = Session::new();
        s.insert(doc("a.txt", b"Vay von. Khac."));
        s.insert(doc("b.txt", b"Khong. Cung vay."));
        let results = s.search(&parse_query("vay"), &SearchParams::default());
        assert_eq!(results.len(), 2);
        assert!(s.search(&parse_query(""), &SearchParams::default()).is_empty());
    }
}
