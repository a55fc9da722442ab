//! The document being edited.
//!
//! A [`Document`] is replaced wholesale on every ingestion or accepted edit;
//! it is never mutated in place.

use serde::{Deserialize, Serialize};

/// How the page count of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pages", rename_all = "snake_case")]
pub enum PageCount {
    /// Reported by the PDF backend.
    Actual(usize),
    /// `ceil(chars / chars_per_page)` heuristic for text input.
    Estimated(usize),
}

impl PageCount {
    /// The page count regardless of how it was obtained.
    pub fn pages(&self) -> usize {
        match self {
            PageCount::Actual(n) | PageCount::Estimated(n) => *n,
        }
    }
}

/// Plain text plus the page count it was admitted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub page_count: PageCount,
    /// Original filename, if the document came from a file.
    pub source_name: Option<String>,
}

impl Document {
    /// Number of whitespace-separated words in the document.
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    pub fn pages(&self) -> usize {
        self.page_count.pages()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Count whitespace-separated words.
///
/// This is the single word-counting rule used by chunking and by the
/// Safety Gate, so both always agree on what a word is.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_whitespace_runs() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one\n\ntwo\tthree  "), 3);
    }

    #[test]
    fn page_count_pages() {
        assert_eq!(PageCount::Actual(4).pages(), 4);
        assert_eq!(PageCount::Estimated(2).pages(), 2);
    }

    #[test]
    fn blank_document_is_empty() {
        let doc = Document {
            text: " \n ".into(),
            page_count: PageCount::Estimated(1),
            source_name: None,
        };
        assert!(doc.is_empty());
        assert_eq!(doc.word_count(), 0);
    }
}
