//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use edgequake_docedit::{ChatMessage, CompletionClient, CompletionOptions, DocEditError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A completion client that replays scripted replies and records every call.
///
/// When the script runs out, the DOCUMENT block of the request is echoed
/// back unchanged.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, DocEditError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String, DocEditError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Echo every request back.
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// User-message payloads, in call order.
    pub fn payloads(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|messages| messages.last().map(|m| m.content.clone()).unwrap_or_default())
            .collect()
    }
}

impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, DocEditError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let scripted = self.replies.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply,
            None => Ok(document_block(&messages[messages.len() - 1].content).to_string()),
        }
    }
}

/// The text between the DOCUMENT quotes of an edit payload.
pub fn document_block(payload: &str) -> &str {
    payload
        .split("DOCUMENT:\n\"\"\"\n")
        .nth(1)
        .and_then(|rest| rest.strip_suffix("\n\"\"\""))
        .unwrap_or_default()
}

/// `n` distinct words: `w0 w1 w2 …`.
pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

pub fn server_error() -> DocEditError {
    DocEditError::Endpoint {
        status: Some(500),
        body: "upstream exploded".into(),
    }
}
