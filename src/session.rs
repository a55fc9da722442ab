//! Session state: the one mutable record behind an editing UI.
//!
//! A [`Session`] owns the current document, the instruction and its flags,
//! the last accepted result and the last error message. It is created at
//! start-up, fully reset by [`Session::clear`], and partially overwritten by
//! every ingestion and run.
//!
//! [`Session::run`] takes `&mut self`, so two runs can never overlap. While a
//! run is in flight its progress is visible through a cloned
//! [`RunStateHandle`].

use crate::config::EditConfig;
use crate::document::Document;
use crate::edit::{edit_document, write_text};
use crate::error::{DocEditError, RunOutcome};
use crate::output::EditOutput;
use crate::pipeline::ingest::{ingest_bytes, ingest_file, ingest_text, InputKind};
use crate::pipeline::llm::CompletionClient;
use crate::pipeline::pdf::PdfBackend;
use crate::progress::{EditProgressCallback, ProgressCallback};
use crate::request::EditRequest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Where a run currently is.
///
/// Terminal states are not represented here: when a run ends the state
/// returns to `Idle` and the outcome is reported by
/// [`Session::last_outcome`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Ingesting,
    /// The instruction-enhancement request is in flight.
    Enhancing,
    Dispatching {
        segment: usize,
        total: usize,
    },
    Gating,
}

/// Shared, read-only view of a session's [`RunState`].
#[derive(Debug, Clone, Default)]
pub struct RunStateHandle(Arc<Mutex<RunState>>);

impl RunStateHandle {
    pub fn get(&self) -> RunState {
        self.0.lock().map(|s| *s).unwrap_or_default()
    }

    fn set(&self, state: RunState) {
        if let Ok(mut guard) = self.0.lock() {
            *guard = state;
        }
    }
}

/// Moves the run state along and forwards events to the caller's callback.
struct StateTracker {
    state: RunStateHandle,
    inner: Option<ProgressCallback>,
}

impl EditProgressCallback for StateTracker {
    fn on_enhance_start(&self) {
        self.state.set(RunState::Enhancing);
        if let Some(ref cb) = self.inner {
            cb.on_enhance_start();
        }
    }

    fn on_run_start(&self, total_segments: usize, input_words: usize) {
        self.state.set(RunState::Dispatching {
            segment: 1,
            total: total_segments,
        });
        if let Some(ref cb) = self.inner {
            cb.on_run_start(total_segments, input_words);
        }
    }

    fn on_segment_start(&self, ordinal: usize, total: usize) {
        self.state.set(RunState::Dispatching {
            segment: ordinal,
            total,
        });
        if let Some(ref cb) = self.inner {
            cb.on_segment_start(ordinal, total);
        }
    }

    fn on_segment_complete(&self, ordinal: usize, total: usize, output_words: usize) {
        if let Some(ref cb) = self.inner {
            cb.on_segment_complete(ordinal, total, output_words);
        }
    }

    fn on_segment_error(&self, ordinal: usize, total: usize, error: &str) {
        if let Some(ref cb) = self.inner {
            cb.on_segment_error(ordinal, total, error);
        }
    }

    fn on_gating(&self, input_words: usize, output_words: usize) {
        self.state.set(RunState::Gating);
        if let Some(ref cb) = self.inner {
            cb.on_gating(input_words, output_words);
        }
    }

    fn on_run_complete(&self, accepted: bool, output_words: usize) {
        if let Some(ref cb) = self.inner {
            cb.on_run_complete(accepted, output_words);
        }
    }
}

/// The single owned state container of an editing session.
#[derive(Debug)]
pub struct Session {
    config: EditConfig,
    document: Option<Document>,
    instruction: String,
    allow_major_rewrite: bool,
    enhance_instruction: bool,
    result: Option<EditOutput>,
    last_error: Option<String>,
    last_outcome: Option<RunOutcome>,
    state: RunStateHandle,
}

impl Session {
    pub fn new(config: EditConfig) -> Self {
        Self {
            config,
            document: None,
            instruction: String::new(),
            allow_major_rewrite: false,
            enhance_instruction: false,
            result: None,
            last_error: None,
            last_outcome: None,
            state: RunStateHandle::default(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// The last accepted result, if any.
    pub fn result(&self) -> Option<&EditOutput> {
        self.result.as_ref()
    }

    /// Human-readable message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Terminal state of the most recent run or ingestion.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// A handle that observes this session's run state from elsewhere.
    pub fn state_handle(&self) -> RunStateHandle {
        self.state.clone()
    }

    // ── Inputs ───────────────────────────────────────────────────────────

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
    }

    pub fn set_allow_major_rewrite(&mut self, allow: bool) {
        self.allow_major_rewrite = allow;
    }

    pub fn set_enhance_instruction(&mut self, enhance: bool) {
        self.enhance_instruction = enhance;
    }

    // ── Ingestion ────────────────────────────────────────────────────────

    /// Replace the document with pasted text.
    pub fn load_text(&mut self, text: impl Into<String>) -> Result<(), DocEditError> {
        self.state.set(RunState::Ingesting);
        let result = ingest_text(text, &self.config);
        self.finish_ingest(result)
    }

    /// Replace the document with uploaded file contents.
    pub fn load_bytes(
        &mut self,
        bytes: &[u8],
        kind: InputKind,
        source_name: Option<&str>,
        backend: &dyn PdfBackend,
    ) -> Result<(), DocEditError> {
        self.state.set(RunState::Ingesting);
        let result = ingest_bytes(bytes, kind, source_name, backend, &self.config);
        self.finish_ingest(result)
    }

    /// Replace the document with a file read from disk.
    pub async fn load_file(
        &mut self,
        path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<(), DocEditError> {
        self.state.set(RunState::Ingesting);
        let result = ingest_file(path, backend, &self.config).await;
        self.finish_ingest(result)
    }

    fn finish_ingest(&mut self, result: Result<Document, DocEditError>) -> Result<(), DocEditError> {
        self.state.set(RunState::Idle);
        match result {
            Ok(document) => {
                self.document = Some(document);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Ingestion failed: {e}");
                self.document = None;
                self.last_error = Some(e.to_string());
                self.last_outcome = Some(RunOutcome::Failed);
                Err(e)
            }
        }
    }

    // ── Running ──────────────────────────────────────────────────────────

    /// Edit the current document with the current instruction.
    ///
    /// On success the result replaces the previous one. On any error the
    /// message replaces the previous error and the previous result is kept.
    pub async fn run<C: CompletionClient>(
        &mut self,
        client: &C,
    ) -> Result<&EditOutput, DocEditError> {
        let outcome = self.run_inner(client).await;
        self.state.set(RunState::Idle);

        match outcome {
            Ok(output) => {
                self.last_error = None;
                self.last_outcome = Some(RunOutcome::Accepted);
                Ok(&*self.result.insert(output))
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.last_outcome = Some(e.outcome());
                Err(e)
            }
        }
    }

    async fn run_inner<C: CompletionClient>(&self, client: &C) -> Result<EditOutput, DocEditError> {
        let document = self
            .document
            .as_ref()
            .filter(|d| !d.is_empty())
            .ok_or(DocEditError::EmptyInput { what: "document" })?;
        if self.instruction.trim().is_empty() {
            return Err(DocEditError::EmptyInput {
                what: "instruction",
            });
        }

        let request = EditRequest::new(self.instruction.clone())
            .allow_major_rewrite(self.allow_major_rewrite)
            .enhance_instruction(self.enhance_instruction);

        let mut config = self.config.clone();
        config.progress_callback = Some(Arc::new(StateTracker {
            state: self.state.clone(),
            inner: self.config.progress_callback.clone(),
        }));

        edit_document(client, document, &request, &config).await
    }

    /// Make the accepted result the document for the next run.
    ///
    /// The original source name is kept so the artifact name stays stable.
    pub fn revise(&mut self) -> Result<(), DocEditError> {
        let text = match self.result {
            Some(ref output) => output.text.clone(),
            None => return Err(DocEditError::EmptyInput { what: "result" }),
        };
        let source_name = self
            .document
            .as_ref()
            .and_then(|d| d.source_name.clone());

        self.state.set(RunState::Ingesting);
        let result = ingest_text(text, &self.config).map(|mut doc| {
            doc.source_name = source_name;
            doc
        });
        self.finish_ingest(result)
    }

    /// Reset everything except the configuration.
    pub fn clear(&mut self) {
        *self = Session::new(self.config.clone());
    }

    // ── Output artifact ──────────────────────────────────────────────────

    /// File name for the downloadable result: `<source stem>_edited.txt`.
    pub fn artifact_name(&self) -> String {
        let base = self
            .document
            .as_ref()
            .and_then(|d| d.source_name.as_deref())
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("document");
        format!("{base}_edited.txt")
    }

    /// Write the accepted result into `dir` under [`Session::artifact_name`].
    pub async fn save_result(&self, dir: &Path) -> Result<PathBuf, DocEditError> {
        let output = self
            .result
            .as_ref()
            .ok_or(DocEditError::EmptyInput { what: "result" })?;
        let path = dir.join(self.artifact_name());
        write_text(&path, &output.text).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::{ChatMessage, CompletionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the DOCUMENT block of each request back, optionally dropping words.
    #[derive(Default)]
    struct EchoClient {
        calls: AtomicUsize,
        keep_words: Option<usize>,
    }

    impl CompletionClient for EchoClient {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<String, DocEditError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let payload = &messages[1].content;
            let body = payload
                .split("DOCUMENT:\n\"\"\"\n")
                .nth(1)
                .and_then(|rest| rest.strip_suffix("\n\"\"\""))
                .unwrap_or_default();
            Ok(match self.keep_words {
                Some(n) => body.split_whitespace().take(n).collect::<Vec<_>>().join(" "),
                None => body.to_uppercase(),
            })
        }
    }

    fn session() -> Session {
        Session::new(EditConfig::default())
    }

    #[tokio::test]
    async fn run_without_instruction_sends_nothing() {
        let mut s = session();
        s.load_text("Some text here.").unwrap();
        let client = EchoClient::default();
        let err = s.run(&client).await.unwrap_err();
        assert!(matches!(err, DocEditError::EmptyInput { what: "instruction" }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(s.last_outcome(), Some(RunOutcome::Failed));
        assert!(s.last_error().unwrap().contains("instruction"));
    }

    #[tokio::test]
    async fn run_without_document_sends_nothing() {
        let mut s = session();
        s.set_instruction("Fix typos");
        let client = EchoClient::default();
        let err = s.run(&client).await.unwrap_err();
        assert!(matches!(err, DocEditError::EmptyInput { what: "document" }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_run_then_revise() {
        let mut s = session();
        s.load_text("one two three").unwrap();
        s.set_instruction("Shout");
        let client = EchoClient::default();

        let text = s.run(&client).await.unwrap().text.clone();
        assert_eq!(text, "ONE TWO THREE");
        assert_eq!(s.last_outcome(), Some(RunOutcome::Accepted));
        assert_eq!(s.state(), RunState::Idle);

        s.revise().unwrap();
        assert_eq!(s.document().unwrap().text, "ONE TWO THREE");
    }

    #[tokio::test]
    async fn rejection_keeps_previous_result() {
        let mut s = session();
        s.load_text("alpha beta gamma delta").unwrap();
        s.set_instruction("Shout");
        s.run(&EchoClient::default()).await.unwrap();

        let shortening = EchoClient {
            keep_words: Some(1),
            ..Default::default()
        };
        let err = s.run(&shortening).await.unwrap_err();
        assert_eq!(err.outcome(), RunOutcome::Rejected);
        assert_eq!(s.last_outcome(), Some(RunOutcome::Rejected));
        assert_eq!(s.result().unwrap().text, "ALPHA BETA GAMMA DELTA");
        assert!(s.last_error().unwrap().contains("rejected"));
    }

    #[test]
    fn failed_ingestion_clears_text_only() {
        let mut s = session();
        s.load_text("first").unwrap();
        s.set_instruction("keep me");
        let err = s.load_text("x".repeat(40_000)).unwrap_err();
        assert!(matches!(err, DocEditError::DocumentTooLarge { .. }));
        assert!(s.document().is_none());
        assert_eq!(s.instruction(), "keep me");
    }

    #[test]
    fn revise_without_result_is_empty_input() {
        let mut s = session();
        assert!(matches!(
            s.revise(),
            Err(DocEditError::EmptyInput { what: "result" })
        ));
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = session();
        s.load_text("text").unwrap();
        s.set_instruction("x");
        s.set_allow_major_rewrite(true);
        s.clear();
        assert!(s.document().is_none());
        assert_eq!(s.instruction(), "");
        assert!(s.last_error().is_none());
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn artifact_name_uses_source_stem() {
        let mut s = session();
        assert_eq!(s.artifact_name(), "document_edited.txt");
        struct NoPdf;
        impl PdfBackend for NoPdf {
            fn load<'a>(
                &'a self,
                _bytes: &'a [u8],
            ) -> Result<Box<dyn crate::pipeline::pdf::LoadedPdf + 'a>, DocEditError> {
                Err(DocEditError::PdfParse {
                    detail: "unused".into(),
                })
            }
        }
        s.load_bytes(b"hello", InputKind::Text, Some("essay.draft.txt"), &NoPdf)
            .unwrap();
        assert_eq!(s.artifact_name(), "essay.draft_edited.txt");
    }
}
