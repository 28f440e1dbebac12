//! Sentence segmenter tuned for regulatory and legal prose.
//!
//! A split point exists after a sentence-final mark (`. ! ? … ;`) followed by
//! whitespace and then an uppercase letter, a digit, an opening quote, or an
//! opening bracket. Abbreviations followed by lowercase text and numbered
//! clauses that continue a line are therefore left intact. This is a
//! precision-first heuristic, not a full sentence boundary detector.
//!
//! Newlines act as a paragraph mark: they never count as the whitespace gap
//! between two sentences, so a paragraph break alone never splits. They are
//! kept inside the returned sentence text.

use crate::models::Sentence;

/// Normalize line endings and collapse blank lines.
///
/// `\r\n` and lone `\r` become `\n`; empty or whitespace-only lines are
/// dropped, so consecutive paragraphs are separated by exactly one `\n`.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    unified
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split already-normalized text into sentences.
///
/// Offsets in the returned sentences are byte offsets into `text`.
/// Whitespace-only input yields no sentences; any other input yields at
/// least one.
pub fn segment(text: &str) -> Vec<Sentence> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if is_terminal(c) {
            let mut j = i + 1;
            while j < chars.len() && is_gap(chars[j].1) {
                j += 1;
            }
            if j > i + 1 && j < chars.len() && opens_sentence(chars[j].1) {
                push_trimmed(&mut sentences, text, start, pos + c.len_utf8());
                start = chars[j].0;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    push_trimmed(&mut sentences, text, start, text.len());

    sentences
}

fn push_trimmed(out: &mut Vec<Sentence>, text: &str, start: usize, end: usize) {
    let piece = &text[start..end];
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = piece.len() - piece.trim_start().len();
    let s = start + lead;
    out.push(Sentence::new(out.len(), s, s + trimmed.len(), trimmed));
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…' | ';')
}

fn is_gap(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

fn opens_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '“' | '‘' | '«' | '(' | '[')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    fn squash(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(segment("").is_empty());
        assert!(segment(" \t ").is_empty());
        assert!(segment(&normalize_text("\n\r\n \n")).is_empty());
    }

    #[test]
    fn splits_on_terminal_then_uppercase() {
        let s = segment("Hạn mức là 500 triệu. Khách hàng cần tài sản! Vay được không? Có.");
        assert_eq!(
            texts(&s),
            vec![
                "Hạn mức là 500 triệu.",
                "Khách hàng cần tài sản!",
                "Vay được không?",
                "Có."
            ]
        );
    }

    #[test]
    fn splits_before_digits_quotes_and_brackets() {
        let s = segment("Điều 1; 2 bên cùng ký. “Trích dẫn” tiếp. (a) mục; [b] mục");
        assert_eq!(
            texts(&s),
            vec!["Điều 1;", "2 bên cùng ký.", "“Trích dẫn” tiếp.", "(a) mục;", "[b] mục"]
        );
    }

    #[test]
    fn does_not_split_before_lowercase() {
        let s = segment("Theo quy định tại khoản 1 v.v. và các điều khác.");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn ellipsis_is_terminal() {
        let s = segment("Chờ đợi… Rồi tiếp tục.");
        assert_eq!(texts(&s), vec!["Chờ đợi…", "Rồi tiếp tục."]);
    }

    #[test]
    fn paragraph_break_is_not_a_split_point() {
        let text = normalize_text("Tiêu đề\r\n\r\n\r\nĐiều 1. Nội dung.\nĐiều 2. Khác.");
        assert_eq!(text, "Tiêu đề\nĐiều 1. Nội dung.\nĐiều 2. Khác.");
        let s = segment(&text);
        assert_eq!(
            texts(&s),
            vec!["Tiêu đề\nĐiều 1.", "Nội dung.\nĐiều 2.", "Khác."]
        );
    }

    #[test]
    fn offsets_point_into_text() {
        let text = "Một.  Hai!   Ba?";
        let s = segment(text);
        assert_eq!(s.len(), 3);
        for (i, sentence) in s.iter().enumerate() {
            assert_eq!(sentence.index, i);
            assert_eq!(&text[sentence.start..sentence.end], sentence.text);
        }
        assert!(s.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn text_without_split_points_is_one_sentence() {
        let s = segment("no punctuation at all in this ocr output");
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].text, "no punctuation at all in this ocr output");
    }

    #[test]
    fn lone_trailing_mark_is_kept() {
        let s = segment(" . ");
        assert_eq!(texts(&s), vec!["."]);
    }

    #[test]
    fn rejoin_preserves_text() {
        let samples = [
            "Một. Hai. Ba.",
            "  Leading   space. Then More!  ",
            "Line one.\nLine two; 3 items. (x) Y",
            "x",
            "A. B. C. D. E. F.",
        ];
        for sample in samples {
            let normalized = normalize_text(sample);
            let s = segment(&normalized);
            assert!(!s.is_empty(), "segmentation dropped {:?}", sample);
            let joined = texts(&s).join(" ");
            assert_eq!(squash(&joined), squash(&normalized));
        }
    }
}
