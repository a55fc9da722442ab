//! Word-count chunking of a document into request-sized segments.
//!
//! Boundaries are purely positional: a segment ends after exactly
//! `max_words` words, wherever that falls in a sentence or paragraph. The
//! model is told which part it is editing (see [`crate::prompts`]) to soften
//! the resulting boundary artefacts.
//!
//! Splitting is lossy for whitespace inside a split document (words are
//! re-joined with single spaces) but always preserves word order.

use serde::{Deserialize, Serialize};

/// A contiguous word-bounded slice of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-indexed position.
    pub ordinal: usize,
    pub total: usize,
    pub text: String,
    pub word_count: usize,
}

impl Segment {
    /// `Some((ordinal, total))` when the document was split, `None` otherwise.
    pub fn part(&self) -> Option<(usize, usize)> {
        (self.total > 1).then_some((self.ordinal, self.total))
    }
}

/// Split `text` into segments of at most `max_words` words.
///
/// If the text fits, a single segment holding the text unchanged is
/// returned. Otherwise the result has `ceil(words / max_words)` segments and
/// every segment except the last holds exactly `max_words` words. A
/// `max_words` of zero is treated as one.
pub fn split(text: &str, max_words: usize) -> Vec<Segment> {
    let max_words = max_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.len() <= max_words {
        return vec![Segment {
            ordinal: 1,
            total: 1,
            text: text.to_string(),
            word_count: words.len(),
        }];
    }

    let total = words.len().div_ceil(max_words);
    words
        .chunks(max_words)
        .enumerate()
        .map(|(i, chunk)| Segment {
            ordinal: i + 1,
            total,
            text: chunk.join(" "),
            word_count: chunk.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn short_text_is_returned_verbatim() {
        let text = "  Keep   this\n\nexactly as is.  ";
        let segs = split(text, 3500);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, text);
        assert_eq!(segs[0].word_count, 5);
        assert_eq!(segs[0].part(), None);
    }

    #[test]
    fn exactly_at_ceiling_is_one_segment() {
        let text = numbered_words(10);
        let segs = split(&text, 10);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, text);
    }

    #[test]
    fn four_thousand_words_make_two_segments() {
        let text = numbered_words(4000);
        let segs = split(&text, 3500);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].word_count, 3500);
        assert_eq!(segs[1].word_count, 500);
        assert_eq!(segs[0].part(), Some((1, 2)));
        assert_eq!(segs[1].part(), Some((2, 2)));
        assert!(segs[1].text.starts_with("w3500 "));
    }

    #[test]
    fn empty_text_is_one_empty_segment() {
        let segs = split("", 5);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].word_count, 0);
    }

    #[test]
    fn zero_ceiling_behaves_like_one() {
        let segs = split("a b c", 0);
        assert_eq!(segs.len(), 3);
        assert!(segs.iter().all(|s| s.word_count == 1));
    }

    mod proptest_split {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn words_survive_in_order(
                content in "[a-zA-Z.,\\n ]{0,2000}",
                max_words in 1usize..400,
            ) {
                let segs = split(&content, max_words);
                let rejoined: Vec<String> = segs
                    .iter()
                    .flat_map(|s| s.text.split_whitespace().map(str::to_string).collect::<Vec<_>>())
                    .collect();
                let original: Vec<&str> = content.split_whitespace().collect();
                prop_assert_eq!(rejoined, original);
            }

            #[test]
            fn segment_count_and_sizes(
                word_count in 0usize..3000,
                max_words in 1usize..500,
            ) {
                let segs = split(&numbered_words(word_count), max_words);
                let expected = if word_count <= max_words { 1 } else { word_count.div_ceil(max_words) };
                prop_assert_eq!(segs.len(), expected);
                for seg in &segs[..segs.len() - 1] {
                    prop_assert_eq!(seg.word_count, max_words);
                }
                prop_assert!(segs.iter().all(|s| s.word_count <= max_words));
                prop_assert!(segs.iter().enumerate().all(|(i, s)| s.ordinal == i + 1 && s.total == segs.len()));
            }
        }
    }
}
