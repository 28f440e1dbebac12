//! Keyword highlighting.
//!
//! Highlights are computed as byte ranges over the snippet text and only
//! turned into markers at render time, so removing the markers always gives
//! back the snippet text unchanged.

use crate::models::{Highlight, Keyword, Snippet};
use crate::normalize::FoldedText;

/// Opening and closing emphasis markers used when rendering a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmphasisStyle {
    pub open: &'static str,
    pub close: &'static str,
}

impl EmphasisStyle {
    /// `<mark>…</mark>`, the default for HTML front-ends.
    pub const HTML: EmphasisStyle = EmphasisStyle {
        open: "<mark>",
        close: "</mark>",
    };
    /// `**…**`
    pub const MARKDOWN: EmphasisStyle = EmphasisStyle {
        open: "**",
        close: "**",
    };
    /// Bold yellow on ANSI terminals.
    pub const ANSI: EmphasisStyle = EmphasisStyle {
        open: "\x1b[1;33m",
        close: "\x1b[0m",
    };
}

impl Default for EmphasisStyle {
    fn default() -> Self {
        Self::HTML
    }
}

/// Locate keyword occurrences in `text`.
///
/// Matching is case- and diacritic-insensitive. Longer keywords are placed
/// first; a shorter keyword never claims text already covered by a longer
/// one, so `"tín dụng"` and `"tín"` produce one highlight, not nested ones.
pub fn find_highlights(text: &str, keywords: &[Keyword]) -> Vec<Highlight> {
    let mut ordered: Vec<&Keyword> = keywords.iter().filter(|k| !k.folded.is_empty()).collect();
    ordered.sort_by(|a, b| b.folded.len().cmp(&a.folded.len()));

    let folded = FoldedText::new(text);
    let mut accepted: Vec<Highlight> = Vec::new();
    for kw in ordered {
        for (start, end) in folded.find_all(&kw.folded) {
            let overlaps = accepted.iter().any(|h| start < h.end && h.start < end);
            if !overlaps {
                accepted.push(Highlight { start, end });
            }
        }
    }
    accepted.sort_by_key(|h| h.start);
    accepted
}

/// Insert markers around each highlight.
pub fn render(text: &str, highlights: &[Highlight], style: &EmphasisStyle) -> String {
    render_with(text, highlights, style, |s| s.to_string())
}

/// Like [`render`] with HTML-escaped text and `<mark>` markers.
pub fn render_html(text: &str, highlights: &[Highlight]) -> String {
    render_with(text, highlights, &EmphasisStyle::HTML, escape_html)
}

fn render_with(
    text: &str,
    highlights: &[Highlight],
    style: &EmphasisStyle,
    piece: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(text.len() + highlights.len() * 16);
    let mut cursor = 0;
    for h in highlights {
        out.push_str(&piece(&text[cursor..h.start]));
        out.push_str(style.open);
        out.push_str(&piece(&text[h.start..h.end]));
        out.push_str(style.close);
        cursor = h.end;
    }
    out.push_str(&piece(&text[cursor..]));
    out
}

/// Remove every marker of `style` from rendered text.
pub fn strip_markers(rendered: &str, style: &EmphasisStyle) -> String {
    rendered.replace(style.open, "").replace(style.close, "")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl Snippet {
    /// Snippet text with highlights wrapped in `style` markers.
    pub fn render(&self, style: &EmphasisStyle) -> String {
        render(&self.text, &self.highlights, style)
    }

    /// Snippet text with the default (`<mark>`) markers.
    pub fn text_with_markers(&self) -> String {
        self.render(&EmphasisStyle::default())
    }

    /// HTML-safe rendering for web front-ends.
    pub fn render_html(&self) -> String {
        render_html(&self.text, &self.highlights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(items: &[&str]) -> Vec<Keyword> {
        items.iter().map(|k| Keyword::new(k)).collect()
    }

    #[test]
    fn highlights_case_insensitively() {
        let text = "Tín dụng và TÍN DỤNG";
        let hs = find_highlights(text, &kws(&["tín dụng"]));
        assert_eq!(hs.len(), 2);
        assert_eq!(
            render(text, &hs, &EmphasisStyle::MARKDOWN),
            "**Tín dụng** và **TÍN DỤNG**"
        );
    }

    #[test]
    fn highlights_unaccented_keyword_in_accented_text() {
        let text = "Khách hàng cần có tài sản bảo đảm.";
        let hs = find_highlights(text, &kws(&["tai san bao dam"]));
        assert_eq!(hs.len(), 1);
        assert_eq!(&text[hs[0].start..hs[0].end], "tài sản bảo đảm");
    }

    #[test]
    fn longest_keyword_wins() {
        let text = "hạn mức tín dụng";
        let hs = find_highlights(text, &kws(&["tín", "tín dụng"]));
        assert_eq!(hs.len(), 1);
        assert_eq!(
            render(text, &hs, &EmphasisStyle::HTML),
            "hạn mức <mark>tín dụng</mark>"
        );
    }

    #[test]
    fn short_keyword_still_marks_elsewhere() {
        let text = "tín dụng, tín chấp";
        let hs = find_highlights(text, &kws(&["tín", "tín dụng"]));
        assert_eq!(
            render(text, &hs, &EmphasisStyle::MARKDOWN),
            "**tín dụng**, **tín** chấp"
        );
    }

    #[test]
    fn strip_round_trips() {
        let text = "Điều kiện vay áp dụng theo quy định; vay tiêu dùng.";
        let hs = find_highlights(text, &kws(&["vay", "quy định"]));
        assert_eq!(hs.len(), 3);
        for style in [EmphasisStyle::HTML, EmphasisStyle::MARKDOWN, EmphasisStyle::ANSI] {
            assert_eq!(strip_markers(&render(text, &hs, &style), &style), text);
        }
    }

    #[test]
    fn html_rendering_escapes_text() {
        let text = "a < b & vay";
        let hs = find_highlights(text, &kws(&["vay"]));
        assert_eq!(render_html(text, &hs), "a &lt; b &amp; <mark>vay</mark>");
    }

    #[test]
    fn no_keywords_no_highlights() {
        assert!(find_highlights("text", &[]).is_empty());
    }
}
