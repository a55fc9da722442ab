//! Edit entry points: run the whole pipeline on one document.
//!
//! [`edit_document`] is the core: it takes an already-ingested
//! [`Document`] and any [`CompletionClient`]. The other functions are
//! conveniences that ingest and build the HTTP client from an [`EditConfig`].

use crate::config::EditConfig;
use crate::document::{word_count, Document, PageCount};
use crate::error::DocEditError;
use crate::output::{retained_percent, EditOutput, EditStats};
use crate::pipeline::chunk::split;
use crate::pipeline::dispatch::{dispatch_segments, enhance_instruction, recombine};
use crate::pipeline::gate::SafetyGate;
use crate::pipeline::ingest::{ingest_file_bytes, ingest_text, read_file};
use crate::pipeline::llm::{CompletionClient, HttpCompletionClient};
use crate::pipeline::pdf::PdfiumBackend;
use crate::request::EditRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Edit a document.
///
/// Runs, in order: input validation, optional instruction enhancement,
/// chunking, sequential dispatch, recombination and the Safety Gate.
///
/// # Errors
/// - [`DocEditError::EmptyInput`] for an empty document or blank
///   instruction; no request is sent.
/// - [`DocEditError::Endpoint`] from the first failing segment; segments
///   already edited are discarded.
/// - [`DocEditError::ExcessiveShortening`] when the recombined text is too
///   short and the request does not allow a major rewrite.
pub async fn edit_document<C: CompletionClient>(
    client: &C,
    document: &Document,
    request: &EditRequest,
    config: &EditConfig,
) -> Result<EditOutput, DocEditError> {
    let total_start = Instant::now();

    // ── Step 1: Validate ─────────────────────────────────────────────────
    if document.is_empty() {
        return Err(DocEditError::EmptyInput { what: "document" });
    }
    if request.is_blank() {
        return Err(DocEditError::EmptyInput {
            what: "instruction",
        });
    }

    let input_words = document.word_count();
    let allow_major = request.allows_major_rewrite();
    info!(
        "Starting edit: {} words, {} pages, major rewrite {}",
        input_words,
        document.pages(),
        if allow_major { "allowed" } else { "not allowed" }
    );

    let llm_start = Instant::now();

    // ── Step 2: Optional instruction enhancement ─────────────────────────
    let instruction = if request.wants_enhancement() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_enhance_start();
        }
        enhance_instruction(client, request.instruction(), config).await
    } else {
        request.instruction().to_string()
    };

    // ── Step 3: Chunk ────────────────────────────────────────────────────
    let segments = split(&document.text, config.max_words_per_segment);
    debug!(
        "Split into {} segment(s) of ≤ {} words",
        segments.len(),
        config.max_words_per_segment
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(segments.len(), input_words);
    }

    // ── Step 4: Dispatch (sequential, abort on first failure) ────────────
    let results = dispatch_segments(client, &segments, &instruction, allow_major, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 5: Recombine ────────────────────────────────────────────────
    let text = recombine(&results);
    let output_words = word_count(&text);
    if let Some(ref cb) = config.progress_callback {
        cb.on_gating(input_words, output_words);
    }

    // ── Step 6: Safety Gate ──────────────────────────────────────────────
    let verdict = SafetyGate::new(config.min_retained_percent).check(
        input_words,
        output_words,
        allow_major,
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(verdict.is_ok(), output_words);
    }
    verdict?;

    let stats = EditStats {
        input_words,
        output_words,
        segment_count: results.len(),
        retained_percent: retained_percent(input_words, output_words),
        instruction_enhanced: request.wants_enhancement() && instruction != request.instruction(),
        major_rewrite_allowed: allow_major,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        llm_duration_ms,
    };

    info!(
        "Edit accepted: {} → {} words ({}%), {} segment(s), {}ms",
        input_words, output_words, stats.retained_percent, stats.segment_count, stats.total_duration_ms
    );

    Ok(EditOutput {
        text,
        segments: results,
        instruction_used: instruction,
        stats,
    })
}

/// Edit pasted text with the HTTP client described by `config`.
pub async fn edit_text(
    text: impl Into<String>,
    request: &EditRequest,
    config: &EditConfig,
) -> Result<EditOutput, DocEditError> {
    let client = HttpCompletionClient::new(config)?;
    let document = ingest_text(text, config)?;
    edit_document(&client, &document, request, config).await
}

/// Edit a file (PDF or text) with the HTTP client described by `config`.
pub async fn edit_file(
    path: impl AsRef<Path>,
    request: &EditRequest,
    config: &EditConfig,
) -> Result<EditOutput, DocEditError> {
    let client = HttpCompletionClient::new(config)?;
    let document = load_file(path.as_ref(), config).await?;
    edit_document(&client, &document, request, config).await
}

/// Edit a file and write the accepted text to `output_path`.
///
/// Nothing is written unless the edit is accepted.
pub async fn edit_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    request: &EditRequest,
    config: &EditConfig,
) -> Result<EditStats, DocEditError> {
    let output = edit_file(input_path, request, config).await?;
    write_text(output_path.as_ref(), &output.text).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`edit_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn edit_sync(
    path: impl AsRef<Path>,
    request: &EditRequest,
    config: &EditConfig,
) -> Result<EditOutput, DocEditError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocEditError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(edit_file(path, request, config))
}

/// What ingestion and chunking would do with a file, without any network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub source_name: Option<String>,
    pub page_count: PageCount,
    pub chars: usize,
    pub words: usize,
    pub segments: usize,
}

impl DocumentSummary {
    pub fn of(document: &Document, config: &EditConfig) -> Self {
        Self {
            source_name: document.source_name.clone(),
            page_count: document.page_count,
            chars: document.text.chars().count(),
            words: document.word_count(),
            segments: split(&document.text, config.max_words_per_segment).len(),
        }
    }
}

/// Ingest a file and summarise it. Does not require an API key.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &EditConfig,
) -> Result<DocumentSummary, DocEditError> {
    let document = load_file(path.as_ref(), config).await?;
    Ok(DocumentSummary::of(&document, config))
}

/// Ingest a file with the pdfium backend.
///
/// The backend lives only inside the synchronous extraction step, so the
/// returned future stays `Send`.
pub async fn load_file(path: &Path, config: &EditConfig) -> Result<Document, DocEditError> {
    let bytes = read_file(path).await?;
    let backend = PdfiumBackend::from_env();
    ingest_file_bytes(path, &bytes, &backend, config)
}

/// Write `text` to `path` atomically (temp file + rename).
pub async fn write_text(path: &Path, text: &str) -> Result<(), DocEditError> {
    let write_err = |source| DocEditError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, text).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
