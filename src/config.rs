//! Configuration types for document editing.
//!
//! All edit behaviour is controlled through [`EditConfig`], built via its
//! [`EditConfigBuilder`]. The limits that define the length-preservation
//! contract (page ceiling, segment size, retained-word percentage) live next
//! to the endpoint settings so a single value describes a run completely.

use crate::error::DocEditError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Default chat-completion endpoint (OpenAI-compatible).
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier sent with every request.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for an edit run.
///
/// Built via [`EditConfig::builder()`] or using [`EditConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docedit::EditConfig;
///
/// let config = EditConfig::builder()
///     .api_key("sk-test")
///     .max_words_per_segment(2000)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_words_per_segment, 2000);
/// ```
#[derive(Clone)]
pub struct EditConfig {
    /// Bearer credential for the completion endpoint. Held in memory only.
    pub api_key: Option<String>,

    /// Full URL of the chat-completion endpoint.
    pub endpoint: String,

    /// Model identifier, e.g. "gpt-4o", "gpt-4o-mini".
    pub model: String,

    /// Maximum tokens the model may generate per segment. Default: 8192.
    ///
    /// A full 3 500-word segment comes back as roughly 4 700 tokens, so the
    /// default leaves headroom for instructions that expand the text.
    pub max_tokens: usize,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Word ceiling per completion request. Default: 3500.
    pub max_words_per_segment: usize,

    /// Maximum document size in pages (actual or estimated). Default: 15.
    pub max_pages: usize,

    /// Characters per page used to estimate the page count of text input.
    /// Default: 2000.
    pub chars_per_page: usize,

    /// Minimum share of the input word count (percent) the edited text must
    /// retain unless a major rewrite is allowed. Default: 90.
    pub min_retained_percent: u32,

    /// Custom edit system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Optional progress callback for per-segment events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 8192,
            temperature: 0.3,
            max_words_per_segment: 3500,
            max_pages: 15,
            chars_per_page: 2000,
            min_retained_percent: 90,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_words_per_segment", &self.max_words_per_segment)
            .field("max_pages", &self.max_pages)
            .field("chars_per_page", &self.chars_per_page)
            .field("min_retained_percent", &self.min_retained_percent)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn EditProgressCallback>"),
            )
            .finish()
    }
}

impl EditConfig {
    /// Create a new builder for `EditConfig`.
    pub fn builder() -> EditConfigBuilder {
        EditConfigBuilder {
            config: Self::default(),
        }
    }

    /// The API key, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Builder for [`EditConfig`].
#[derive(Debug)]
pub struct EditConfigBuilder {
    config: EditConfig,
}

impl EditConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_words_per_segment(mut self, n: usize) -> Self {
        self.config.max_words_per_segment = n;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn chars_per_page(mut self, n: usize) -> Self {
        self.config.chars_per_page = n;
        self
    }

    pub fn min_retained_percent(mut self, pct: u32) -> Self {
        self.config.min_retained_percent = pct.min(100);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Attach a progress callback invoked as each segment is dispatched.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EditConfig, DocEditError> {
        let c = &self.config;
        if c.max_words_per_segment == 0 {
            return Err(DocEditError::InvalidConfig(
                "Segment word ceiling must be ≥ 1".into(),
            ));
        }
        if c.max_pages == 0 {
            return Err(DocEditError::InvalidConfig("Page limit must be ≥ 1".into()));
        }
        if c.chars_per_page == 0 {
            return Err(DocEditError::InvalidConfig(
                "Characters per page must be ≥ 1".into(),
            ));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(DocEditError::InvalidConfig(format!(
                "Endpoint must be an HTTP(S) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(DocEditError::InvalidConfig("Model must not be empty".into()));
        }
        Ok(self.config)
    }
}
