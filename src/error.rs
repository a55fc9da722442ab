//! Error types for the edgequake-docedit library.
//!
//! Every failure is terminal for the current run: there is no retry and no
//! partial fallback. A single enum, [`DocEditError`], covers all of them.
//!
//! Callers that drive a UI usually want to know *how* a run ended rather
//! than the exact variant. [`DocEditError::outcome`] folds every error into
//! one of the two non-accepted terminal states of a run:
//!
//! * [`RunOutcome::Rejected`]: the Safety Gate refused the recombined text
//!   (only [`DocEditError::ExcessiveShortening`]).
//! * [`RunOutcome::Failed`]: anything else (bad input, endpoint failure, …).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-docedit library.
#[derive(Debug, Error)]
pub enum DocEditError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No API key was supplied; the request was never sent.
    #[error("No API key configured.\nProvide one with --api-key or OPENAI_API_KEY.")]
    MissingCredential,

    /// The document (actual or estimated pages) exceeds the page limit.
    #[error("Document is too large: {pages} pages (limit is {limit}).\nSplit it and edit the parts separately.")]
    DocumentTooLarge { pages: usize, limit: usize },

    /// The PDF could not be opened or its text layer could not be read.
    #[error("Could not read PDF: {detail}")]
    PdfParse { detail: String },

    /// A document or an instruction is missing.
    #[error("Nothing to do: {what} is empty")]
    EmptyInput { what: &'static str },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Endpoint errors ───────────────────────────────────────────────────
    /// Non-success HTTP status or transport failure from the completion call.
    ///
    /// `status` is `None` when no HTTP response was received at all.
    #[error("{}", endpoint_message(.status, .body))]
    Endpoint { status: Option<u16>, body: String },

    // ── Safety Gate ───────────────────────────────────────────────────────
    /// The edited text lost too many words and the caller did not allow a
    /// major rewrite.
    #[error(
        "Edit rejected: output has {output_words} words, below {min_percent}% of the \
         original {input_words} words.\nAllow a major rewrite to accept shorter output."
    )]
    ExcessiveShortening {
        input_words: usize,
        output_words: usize,
        min_percent: u32,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF input needs the pdfium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium, or\n\
  • install libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn endpoint_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("Completion endpoint returned HTTP {code}: {body}"),
        None => format!("Completion endpoint unreachable: {body}"),
    }
}

/// Terminal state of a single edit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The recombined text passed the Safety Gate.
    Accepted,
    /// The Safety Gate refused the recombined text.
    Rejected,
    /// Ingestion, validation or dispatch failed.
    Failed,
}

impl DocEditError {
    /// Classify this error as the terminal state of the run it ended.
    pub fn outcome(&self) -> RunOutcome {
        match self {
            DocEditError::ExcessiveShortening { .. } => RunOutcome::Rejected,
            _ => RunOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_display() {
        let e = DocEditError::DocumentTooLarge {
            pages: 16,
            limit: 15,
        };
        let msg = e.to_string();
        assert!(msg.contains("16 pages"), "got: {msg}");
        assert!(msg.contains("limit is 15"), "got: {msg}");
    }

    #[test]
    fn endpoint_display_with_status() {
        let e = DocEditError::Endpoint {
            status: Some(401),
            body: "invalid key".into(),
        };
        assert!(e.to_string().contains("HTTP 401"));
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn endpoint_display_without_status() {
        let e = DocEditError::Endpoint {
            status: None,
            body: "connection refused".into(),
        };
        assert!(e.to_string().contains("unreachable"));
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn shortening_display() {
        let e = DocEditError::ExcessiveShortening {
            input_words: 1000,
            output_words: 899,
            min_percent: 90,
        };
        let msg = e.to_string();
        assert!(msg.contains("899 words"), "got: {msg}");
        assert!(msg.contains("90%"), "got: {msg}");
    }

    #[test]
    fn only_shortening_is_a_rejection() {
        let rejected = DocEditError::ExcessiveShortening {
            input_words: 10,
            output_words: 1,
            min_percent: 90,
        };
        assert_eq!(rejected.outcome(), RunOutcome::Rejected);
        assert_eq!(DocEditError::MissingCredential.outcome(), RunOutcome::Failed);
        assert_eq!(
            DocEditError::EmptyInput { what: "instruction" }.outcome(),
            RunOutcome::Failed
        );
    }
}
