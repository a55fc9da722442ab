//! Pipeline stages for document editing.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the network-facing step can be replaced with a scripted client.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ chunk ──▶ dispatch ──▶ recombine ──▶ gate
//! (file/text) (words)  (LLM, seq.)   ("\n\n")     (≥ 90 %)
//! ```
//!
//! 1. [`ingest`]     : file bytes or pasted text → `Document`, page limit
//! 2. [`pdf`]        : the PDF text-extraction capability used by `ingest`
//! 3. [`chunk`]      : positional word-count segments
//! 4. [`dispatch`]   : one completion call per segment, in order, abort on error
//! 5. [`llm`]        : the completion client; the only stage with network I/O
//! 6. [`postprocess`]: word-preserving cleanup of each model reply
//! 7. [`gate`]       : length-preservation check on the recombined text

pub mod chunk;
pub mod dispatch;
pub mod gate;
pub mod ingest;
pub mod llm;
pub mod pdf;
pub mod postprocess;
