//! Text normalization for matching.
//!
//! Matching compares *folded* text: diacritics removed (transliterated to
//! ASCII), lower-cased, and whitespace runs collapsed to a single space.
//! Folding is applied only to comparison copies; display text is never
//! altered. [`FoldedText`] keeps a byte map from the folded copy back to the
//! original so matches found in folded space can be highlighted in the
//! original spelling.

/// Fold `text` for comparison and trim surrounding whitespace.
///
/// ```
/// use docfind_core::normalize::fold;
/// assert_eq!(fold("  Tài sản   BẢO ĐẢM "), "tai san bao dam");
/// ```
pub fn fold(text: &str) -> String {
    FoldedText::new(text).folded.trim().to_string()
}

/// A folded copy of a string plus, for every folded byte, the byte range of
/// the original character it came from.
#[derive(Debug, Clone)]
pub struct FoldedText {
    pub folded: String,
    origin: Vec<(usize, usize)>,
}

impl FoldedText {
    pub fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());

        for (pos, c) in text.char_indices() {
            let span = (pos, pos + c.len_utf8());
            if c.is_whitespace() {
                push_space(&mut folded, &mut origin, span);
                continue;
            }
            if is_combining_mark(c) {
                extend_last(&mut origin, span.1);
                continue;
            }
            let before = folded.len();
            match deunicode::deunicode_char(c) {
                Some(ascii) => {
                    for m in ascii.chars() {
                        if m.is_whitespace() {
                            push_space(&mut folded, &mut origin, span);
                        } else {
                            push_char(&mut folded, &mut origin, m.to_ascii_lowercase(), span);
                        }
                    }
                }
                None => {
                    for m in c.to_lowercase() {
                        push_char(&mut folded, &mut origin, m, span);
                    }
                }
            }
            if folded.len() == before {
                extend_last(&mut origin, span.1);
            }
        }

        Self { folded, origin }
    }

    /// Byte ranges in the original text of every non-overlapping occurrence
    /// of `needle` (which must already be folded), left to right.
    pub fn find_all(&self, needle: &str) -> Vec<(usize, usize)> {
        if needle.is_empty() {
            return Vec::new();
        }
        self.folded
            .match_indices(needle)
            .map(|(at, m)| {
                let start = self.origin[at].0;
                let end = self.origin[at + m.len() - 1].1;
                (start, end)
            })
            .collect()
    }
}

fn push_space(folded: &mut String, origin: &mut Vec<(usize, usize)>, span: (usize, usize)) {
    if folded.ends_with(' ') {
        return;
    }
    folded.push(' ');
    origin.push(span);
}

fn push_char(folded: &mut String, origin: &mut Vec<(usize, usize)>, c: char, span: (usize, usize)) {
    folded.push(c);
    for _ in 0..c.len_utf8() {
        origin.push(span);
    }
}

/// Combining diacritical marks (U+0300..=U+036F) fold to nothing.
fn is_combining_mark(c: char) -> bool {
    ('\u{300}'..='\u{36f}').contains(&c)
}

/// A character that folds to nothing belongs to the preceding one: widen the
/// origin of the last folded character to `end`.
fn extend_last(origin: &mut [(usize, usize)], end: usize) {
    let Some(&last) = origin.last() else {
        return;
    };
    for entry in origin.iter_mut().rev().take_while(|e| **e == last) {
        entry.1 = end;
    }
}

/// Replace every run of two or more whitespace characters with one space.
/// Single whitespace characters (including lone newlines) are kept.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(c);
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ => out.push(' '),
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_vietnamese_diacritics() {
        assert_eq!(fold("Hạn mức tín dụng"), "han muc tin dung");
        assert_eq!(fold("ĐIỀU KIỆN"), "dieu kien");
    }

    #[test]
    fn fold_collapses_whitespace() {
        assert_eq!(fold("a \t\n  b"), "a b");
        assert_eq!(fold("   "), "");
    }

    #[test]
    fn find_all_maps_back_to_original_spelling() {
        let text = "Khách hàng cần có Tài Sản bảo đảm.";
        let folded = FoldedText::new(text);
        let hits = folded.find_all(&fold("tài sản"));
        assert_eq!(hits.len(), 1);
        let (s, e) = hits[0];
        assert_eq!(&text[s..e], "Tài Sản");
    }

    #[test]
    fn find_all_spans_collapsed_whitespace() {
        let text = "tín \n  dụng";
        let hits = FoldedText::new(text).find_all("tin dung");
        assert_eq!(hits, vec![(0, text.len())]);
    }

    #[test]
    fn find_all_covers_trailing_combining_marks() {
        // Decomposed "Cà phê": each accent is a separate combining code point.
        let text = "Ca\u{300} phe\u{302}";
        assert_eq!(fold(text), "ca phe");
        let hits = FoldedText::new(text).find_all("ca phe");
        assert_eq!(hits, vec![(0, text.len())]);

        let hits = FoldedText::new(text).find_all("ca");
        assert_eq!(&text[hits[0].0..hits[0].1], "Ca\u{300}");
    }

    #[test]
    fn find_all_is_non_overlapping() {
        let hits = FoldedText::new("aaaa").find_all("aa");
        assert_eq!(hits, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn collapse_keeps_single_newline() {
        assert_eq!(collapse_whitespace("a\nb"), "a\nb");
        assert_eq!(collapse_whitespace("a  \n b"), "a b");
        assert_eq!(collapse_whitespace("a   b c"), "a b c");
    }
}
