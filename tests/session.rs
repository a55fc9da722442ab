//! Session workflow tests: ingestion from disk, runs, revision and saving.

mod common;

use common::{server_error, words, ScriptedClient};
use edgequake_docedit::{
    ChatMessage, CompletionClient, CompletionOptions, DocEditError, EditConfig, PdfiumBackend,
    RunOutcome, RunState, RunStateHandle, Session,
};
use std::sync::Mutex;

#[tokio::test]
async fn file_to_artifact_round() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chapter one.txt");
    std::fs::write(&input, "The quick brown fox jumps over the lazy dog.").unwrap();

    let mut session = Session::new(EditConfig::default());
    session
        .load_file(&input, &PdfiumBackend::default())
        .await
        .unwrap();
    assert_eq!(
        session.document().unwrap().source_name.as_deref(),
        Some("chapter one.txt")
    );

    session.set_instruction("Keep as is");
    session.run(&ScriptedClient::echo()).await.unwrap();

    let out_dir = dir.path().join("out");
    let saved = session.save_result(&out_dir).await.unwrap();
    assert_eq!(saved, out_dir.join("chapter one_edited.txt"));
    assert_eq!(
        std::fs::read_to_string(&saved).unwrap(),
        "The quick brown fox jumps over the lazy dog."
    );
    assert!(!out_dir.join("chapter one_edited.txt.tmp").exists());
}

#[tokio::test]
async fn missing_file_clears_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(EditConfig::default());
    session.load_text("previous text").unwrap();

    let err = session
        .load_file(&dir.path().join("nope.txt"), &PdfiumBackend::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DocEditError::FileNotFound { .. }));
    assert!(session.document().is_none());
    assert!(session.last_error().unwrap().contains("nope.txt"));
}

#[tokio::test]
async fn save_without_result_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(EditConfig::default());
    let err = session.save_result(dir.path()).await.unwrap_err();
    assert!(matches!(err, DocEditError::EmptyInput { what: "result" }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_run_keeps_previous_result() {
    let mut session = Session::new(EditConfig::default());
    session.load_text(words(50)).unwrap();
    session.set_instruction("Echo");
    session.run(&ScriptedClient::echo()).await.unwrap();

    let err = session
        .run(&ScriptedClient::new([Err(server_error())]))
        .await
        .unwrap_err();

    assert_eq!(err.outcome(), RunOutcome::Failed);
    assert_eq!(session.last_outcome(), Some(RunOutcome::Failed));
    assert_eq!(session.result().unwrap().text, words(50));
    assert!(session.last_error().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn revision_chain_feeds_accepted_text_forward() {
    let mut session = Session::new(EditConfig::default());
    session.load_text("draft text here").unwrap();
    session.set_instruction("First pass");
    let client = ScriptedClient::new([
        Ok("first pass text".to_string()),
        Ok("second pass text".to_string()),
    ]);

    session.run(&client).await.unwrap();
    session.revise().unwrap();
    session.set_instruction("Second pass");
    session.run(&client).await.unwrap();

    let payloads = client.payloads();
    assert!(payloads[1].contains("first pass text"));
    assert!(payloads[1].contains("INSTRUCTION:\nSecond pass"));
    assert_eq!(session.result().unwrap().text, "second pass text");
}

/// Records the session state observed while each request is in flight.
struct StateProbe {
    handle: RunStateHandle,
    seen: Mutex<Vec<RunState>>,
}

impl CompletionClient for StateProbe {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, DocEditError> {
        self.seen.lock().unwrap().push(self.handle.get());
        Ok(common::document_block(&messages[1].content).to_string())
    }
}

#[tokio::test]
async fn run_state_tracks_dispatch_and_returns_to_idle() {
    let config = EditConfig::builder().max_words_per_segment(2).build().unwrap();
    let mut session = Session::new(config);
    session.load_text("one two three four five").unwrap();
    session.set_instruction("Echo");

    let probe = StateProbe {
        handle: session.state_handle(),
        seen: Mutex::new(Vec::new()),
    };
    session.run(&probe).await.unwrap();

    assert_eq!(
        *probe.seen.lock().unwrap(),
        vec![
            RunState::Dispatching { segment: 1, total: 3 },
            RunState::Dispatching { segment: 2, total: 3 },
            RunState::Dispatching { segment: 3, total: 3 },
        ]
    );
    assert_eq!(session.state(), RunState::Idle);
    assert_eq!(session.last_outcome(), Some(RunOutcome::Accepted));
}

#[tokio::test]
async fn run_state_covers_instruction_enhancement() {
    let mut session = Session::new(EditConfig::default());
    session.load_text("one two three").unwrap();
    session.set_instruction("Echo");
    session.set_enhance_instruction(true);

    let probe = StateProbe {
        handle: session.state_handle(),
        seen: Mutex::new(Vec::new()),
    };
    session.run(&probe).await.unwrap();

    let seen = probe.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            RunState::Enhancing,
            RunState::Dispatching { segment: 1, total: 1 },
        ]
    );
    assert!(!seen.contains(&RunState::Idle));
    assert_eq!(session.state(), RunState::Idle);
}
