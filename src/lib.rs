//! # edgequake-docedit
//!
//! Apply a natural-language editing instruction to a whole document with a
//! chat-completion model, without letting the model quietly shorten it.
//!
//! ## Why this crate?
//!
//! Models asked to "fix the grammar" of a long document tend to summarise,
//! drop paragraphs, or stop early. This crate splits the document into
//! word-bounded segments, edits them strictly in order, recombines them and
//! then refuses any result that lost more than 10 % of the words, unless the
//! caller explicitly allowed a major rewrite.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / text
//!  │
//!  ├─ 1. Ingest    extract PDF text (≤ 15 pages) or accept pasted text
//!  ├─ 2. Enhance   optional: sharpen the instruction with one extra call
//!  ├─ 3. Chunk     positional segments of ≤ 3 500 words
//!  ├─ 4. Dispatch  one completion call per segment, in order
//!  ├─ 5. Combine   join edited segments with blank lines
//!  └─ 6. Gate      reject if output < 90 % of input words
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docedit::{edit_file, EditConfig, EditRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EditConfig::builder()
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let request = EditRequest::new("Fix spelling and grammar; keep British English.");
//!     let output = edit_file("essay.pdf", &request, &config).await?;
//!     println!("{}", output.text);
//!     eprintln!(
//!         "{} → {} words ({}%)",
//!         output.stats.input_words, output.stats.output_words, output.stats.retained_percent
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docedit` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docedit = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EditConfig, EditConfigBuilder};
pub use document::{Document, PageCount};
pub use edit::{edit_document, edit_file, edit_sync, edit_text, edit_to_file, inspect, DocumentSummary};
pub use error::{DocEditError, RunOutcome};
pub use output::{EditOutput, EditStats, SegmentResult};
pub use pipeline::chunk::{split, Segment};
pub use pipeline::gate::SafetyGate;
pub use pipeline::ingest::InputKind;
pub use pipeline::llm::{ChatMessage, CompletionClient, CompletionOptions, HttpCompletionClient};
pub use pipeline::pdf::{LoadedPdf, PdfBackend, PdfiumBackend};
pub use progress::{EditProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::EditRequest;
pub use session::{RunState, RunStateHandle, Session};
