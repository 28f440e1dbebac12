//! Keyword search with context-window merging.
//!
//! # Algorithm
//!
//! 1. A sentence is a hit when its folded text contains the folded form of
//!    *any* keyword (OR semantics).
//! 2. Each hit `i` expands to the window `[i - before, i + after + 1)`,
//!    clamped to the document.
//! 3. Windows are merged in order: a window starting at or before the end of
//!    the previous one extends it, so overlapping or touching context becomes
//!    a single snippet.
//! 4. Each window is joined, whitespace-collapsed, and highlighted.
//! 5. At most `max_per_document` snippets are returned per document.

use serde::Serialize;

use crate::highlight::find_highlights;
use crate::models::{ContextWindow, Document, Keyword, Match, Sentence, Snippet};
use crate::normalize::collapse_whitespace;

/// Context sizes and limits, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    /// Sentences of context before each hit.
    pub before: usize,
    /// Sentences of context after each hit.
    pub after: usize,
    /// Maximum snippets per document.
    pub max_per_document: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            before: 3,
            after: 3,
            max_per_document: 200,
        }
    }
}

/// Split a raw query on `;` or `,` into keywords.
///
/// Parts are trimmed; empty parts and parts whose folded form repeats an
/// earlier keyword are dropped.
pub fn parse_query(raw: &str) -> Vec<Keyword> {
    let mut keywords: Vec<Keyword> = Vec::new();
    for part in raw.split([';', ',']) {
        let kw = Keyword::new(part);
        if kw.folded.is_empty() || keywords.iter().any(|k| k.folded == kw.folded) {
            continue;
        }
        keywords.push(kw);
    }
    keywords
}

/// Sentences containing at least one keyword, in document order.
pub fn find_matches(sentences: &[Sentence], keywords: &[Keyword]) -> Vec<Match> {
    sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| keywords.iter().any(|k| s.folded.contains(&k.folded)))
        .map(|(i, _)| Match { sentence_index: i })
        .collect()
}

/// Expand hits into context windows and merge overlapping or adjacent ones.
///
/// `hits` must be sorted ascending. The result is strictly increasing and
/// non-overlapping, and every window lies within `[0, len)`.
pub fn context_windows(
    hits: &[Match],
    len: usize,
    before: usize,
    after: usize,
) -> Vec<ContextWindow> {
    let mut windows: Vec<ContextWindow> = Vec::new();
    for hit in hits {
        let i = hit.sentence_index;
        let start = i.saturating_sub(before);
        let end = len.min(i.saturating_add(after).saturating_add(1));
        match windows.last_mut() {
            Some(last) if start <= last.end => last.end = last.end.max(end),
            _ => windows.push(ContextWindow { start, end }),
        }
    }
    windows
}

/// Search one document and render its snippets.
pub fn search(document: &Document, keywords: &[Keyword], params: &SearchParams) -> Vec<Snippet> {
    search_sentences(&document.name, &document.sentences, keywords, params)
}

/// Search a bare sentence sequence, attributing snippets to `document_name`.
pub fn search_sentences(
    document_name: &str,
    sentences: &[Sentence],
    keywords: &[Keyword],
    params: &SearchParams,
) -> Vec<Snippet> {
    if keywords.is_empty() || params.max_per_document == 0 {
        return Vec::new();
    }

    let hits = find_matches(sentences, keywords);
    context_windows(&hits, sentences.len(), params.before, params.after)
        .into_iter()
        .take(params.max_per_document)
        .map(|window| render_window(document_name, sentences, window, keywords))
        .collect()
}

/// Search every document in order with already-parsed keywords.
///
/// No keywords yields an empty result.
pub fn search_all<'a, I>(documents: I, keywords: &[Keyword], params: &SearchParams) -> Vec<Snippet>
where
    I: IntoIterator<Item = &'a Document>,
{
    if keywords.is_empty() {
        return Vec::new();
    }
    documents
        .into_iter()
        .flat_map(|doc| search(doc, keywords, params))
        .collect()
}

fn render_window(
    document_name: &str,
    sentences: &[Sentence],
    window: ContextWindow,
    keywords: &[Keyword],
) -> Snippet {
    let joined = sentences[window.start..window.end]
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let text = collapse_whitespace(joined.trim());
    let highlights = find_highlights(&text, keywords);
    Snippet {
        document_name: document_name.to_string(),
        window,
        text,
        highlights,
    }
}
