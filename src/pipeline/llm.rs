//! Chat-completion client: the only stage with network I/O.
//!
//! [`CompletionClient`] is the seam between the pipeline and the model.
//! [`HttpCompletionClient`] speaks the OpenAI-compatible
//! `POST /chat/completions` protocol; tests substitute scripted clients.
//!
//! No retry, backoff or timeout: a failed call ends the run, and a stalled
//! call stalls it until the transport gives up.

use crate::config::EditConfig;
use crate::error::DocEditError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role/content pair of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Generation parameters sent with each request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl CompletionOptions {
    /// Options for edit requests.
    pub fn for_edit(config: &EditConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Options for the instruction-enhancement call: short and near-deterministic.
    pub fn for_enhancement(config: &EditConfig) -> Self {
        Self {
            max_tokens: config.max_tokens.min(1024),
            temperature: config.temperature.min(0.2),
        }
    }
}

/// A chat-completion backend.
pub trait CompletionClient: Send + Sync {
    /// Send `messages` and return the assistant's text.
    ///
    /// An empty string is a valid reply; only transport or protocol failures
    /// are errors.
    fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<String, DocEditError>> + Send;
}

/// OpenAI-compatible HTTP client authenticated with a bearer token.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for HttpCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCompletionClient")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl HttpCompletionClient {
    /// Build a client from the config.
    ///
    /// # Errors
    /// [`DocEditError::MissingCredential`] when no non-blank API key is set;
    /// nothing is ever sent in that case.
    pub fn new(config: &EditConfig) -> Result<Self, DocEditError> {
        let api_key = config
            .credential()
            .ok_or(DocEditError::MissingCredential)?
            .to_string();

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DocEditError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Replace the underlying `reqwest::Client` (proxies, custom TLS, …).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a response body.
///
/// Any missing link in that path yields an empty string; only a body that
/// is not JSON at all is an error.
pub fn extract_content(body: &str) -> Result<String, serde_json::Error> {
    let resp: ChatResponse = serde_json::from_str(body)?;
    Ok(resp
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default())
}

impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, DocEditError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocEditError::Endpoint {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| DocEditError::Endpoint {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            error!("Completion endpoint error {status}: {text}");
            return Err(DocEditError::Endpoint {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let content = extract_content(&text).map_err(|e| DocEditError::Endpoint {
            status: Some(status.as_u16()),
            body: format!("undecodable response ({e}): {text}"),
        })?;

        debug!(
            "Completion: {} messages → {} chars in {:?}",
            messages.len(),
            content.len(),
            start.elapsed()
        );
        Ok(content)
    }
}
