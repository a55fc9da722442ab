//! Ingestion: turn a file or pasted text into a [`Document`].
//!
//! PDFs report their page count before any text is read, so an oversized PDF
//! is refused without extracting a single page. Text input gets an estimated
//! page count of `ceil(chars / chars_per_page)`. Either way a document over
//! the page limit is rejected outright; it is never truncated.

use crate::config::EditConfig;
use crate::document::{Document, PageCount};
use crate::error::DocEditError;
use crate::pipeline::pdf::PdfBackend;
use std::path::Path;
use tracing::{debug, info};

/// Separator between the text of consecutive PDF pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// How file bytes should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Text,
}

impl InputKind {
    /// PDF when the name ends in `.pdf` or the bytes carry the `%PDF` magic.
    pub fn detect(name: Option<&str>, bytes: &[u8]) -> Self {
        let by_name = name
            .map(|n| n.to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false);
        if by_name || bytes.starts_with(b"%PDF") {
            InputKind::Pdf
        } else {
            InputKind::Text
        }
    }

    /// Map a MIME type: `application/pdf` is a PDF, everything else text.
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().eq_ignore_ascii_case("application/pdf") {
            InputKind::Pdf
        } else {
            InputKind::Text
        }
    }
}

/// Estimated page count of plain text: `ceil(chars / chars_per_page)`.
pub fn estimate_pages(text: &str, chars_per_page: usize) -> usize {
    text.chars().count().div_ceil(chars_per_page.max(1))
}

fn check_page_limit(pages: usize, config: &EditConfig) -> Result<(), DocEditError> {
    if pages > config.max_pages {
        return Err(DocEditError::DocumentTooLarge {
            pages,
            limit: config.max_pages,
        });
    }
    Ok(())
}

/// Admit pasted text as a document.
pub fn ingest_text(text: impl Into<String>, config: &EditConfig) -> Result<Document, DocEditError> {
    let text = text.into();
    let pages = estimate_pages(&text, config.chars_per_page);
    check_page_limit(pages, config)?;
    debug!("Ingested {} bytes of text as ~{} pages", text.len(), pages);
    Ok(Document {
        text,
        page_count: PageCount::Estimated(pages),
        source_name: None,
    })
}

/// Admit file contents as a document.
///
/// Text bytes are decoded as UTF-8, replacing invalid sequences.
pub fn ingest_bytes(
    bytes: &[u8],
    kind: InputKind,
    source_name: Option<&str>,
    backend: &dyn PdfBackend,
    config: &EditConfig,
) -> Result<Document, DocEditError> {
    let mut document = match kind {
        InputKind::Pdf => extract_pdf(bytes, backend, config)?,
        InputKind::Text => ingest_text(String::from_utf8_lossy(bytes).into_owned(), config)?,
    };
    document.source_name = source_name.map(str::to_string);
    Ok(document)
}

/// Read a file from disk and admit it as a document.
pub async fn ingest_file(
    path: &Path,
    backend: &dyn PdfBackend,
    config: &EditConfig,
) -> Result<Document, DocEditError> {
    let bytes = read_file(path).await?;
    ingest_file_bytes(path, &bytes, backend, config)
}

/// Read a whole input file, mapping I/O failures to input errors.
pub async fn read_file(path: &Path) -> Result<Vec<u8>, DocEditError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocEditError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => DocEditError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocEditError::Internal(format!("reading {}: {e}", path.display())),
    })
}

/// Admit bytes already read from `path`, detecting the input kind from the
/// file name and content.
pub fn ingest_file_bytes(
    path: &Path,
    bytes: &[u8],
    backend: &dyn PdfBackend,
    config: &EditConfig,
) -> Result<Document, DocEditError> {
    let name = path.file_name().and_then(|n| n.to_str());
    let kind = InputKind::detect(name, bytes);
    info!("Ingesting {} ({:?}, {} bytes)", path.display(), kind, bytes.len());
    ingest_bytes(bytes, kind, name, backend, config)
}

/// Extract the text layer of a PDF, refusing oversized documents first.
fn extract_pdf(
    bytes: &[u8],
    backend: &dyn PdfBackend,
    config: &EditConfig,
) -> Result<Document, DocEditError> {
    let pdf = backend.load(bytes)?;
    let pages = pdf.page_count();
    check_page_limit(pages, config)?;

    let mut page_texts = Vec::with_capacity(pages);
    for page in 1..=pages {
        page_texts.push(pdf.page_fragments(page)?.join(" "));
    }

    debug!("Extracted text from {} PDF pages", pages);
    Ok(Document {
        text: page_texts.join(PAGE_SEPARATOR),
        page_count: PageCount::Actual(pages),
        source_name: None,
    })
}
