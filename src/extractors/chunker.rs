// src/extractors/chunker.rs
use std::num::NonZeroUsize;

/// Splits `text` into consecutive segments of at most `max_chars` characters.
///
/// Splitting is purely length-based: a segment may end mid-row or mid-word,
/// but never inside a multi-byte character. Concatenating the segments gives
/// back `text`, and there are `ceil(chars / max_chars)` of them.
pub fn chunk_text(text: &str, max_chars: NonZeroUsize) -> Vec<&str> {
    let max = max_chars.get();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max {
            segments.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn expected_count(text: &str, max: usize) -> usize {
        text.chars().count().div_ceil(max)
    }

    #[test]
    fn test_empty_text_yields_no_segments() {
        assert!(chunk_text("", size(500)).is_empty());
    }

    #[test]
    fn test_short_text_is_one_segment() {
        let text = "www.bank.example.com,Name,Rate\n12-month CD,4.50\n";
        assert_eq!(chunk_text(text, size(500)), vec![text]);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_segment() {
        let segments = chunk_text("abcdef", size(3));
        assert_eq!(segments, vec!["abc", "def"]);
    }

    #[test]
    fn test_cuts_mid_token() {
        let segments = chunk_text("Name,Rate\n12-month CD,4.50", size(7));
        assert_eq!(segments, vec!["Name,Ra", "te\n12-m", "onth CD", ",4.50"]);
    }

    #[test]
    fn test_reconstruction_and_count() {
        let texts = [
            "",
            "a",
            "Name,Rate\n12-month CD,4.50\nName,Rate\n24-month CD,4.25\n",
            "Dividend Rate – APY ≥ $1,000 — Share Certificate 0.55% ✓",
            "ééééé",
        ];
        for text in texts {
            for max in [1, 2, 3, 7, 50, 500] {
                let segments = chunk_text(text, size(max));
                assert_eq!(segments.concat(), text, "reconstruction failed for max {}", max);
                assert_eq!(segments.len(), expected_count(text, max), "count wrong for max {}", max);
                assert!(segments.iter().all(|s| s.chars().count() <= max));
                assert!(segments.iter().all(|s| !s.is_empty()));
            }
        }
    }

    #[test]
    fn test_multibyte_characters_are_counted_once() {
        let segments = chunk_text("ééé", size(2));
        assert_eq!(segments, vec!["éé", "é"]);
    }
}
