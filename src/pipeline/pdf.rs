//! PDF text extraction capability.
//!
//! The pipeline only needs two things from a PDF: how many pages it has and
//! the text fragments on each page. [`PdfBackend`] captures exactly that, so
//! ingestion can check the page limit before any text is pulled out and tests
//! can run without the native pdfium library.
//!
//! [`PdfiumBackend`] is the production implementation on `pdfium-render`.

use crate::error::DocEditError;
use once_cell::unsync::OnceCell;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an existing pdfium library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Opens PDF bytes.
pub trait PdfBackend {
    /// Parse `bytes` into a document handle.
    ///
    /// # Errors
    /// [`DocEditError::PdfParse`] when the bytes are not a readable PDF.
    fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn LoadedPdf + 'a>, DocEditError>;
}

/// An opened PDF document.
pub trait LoadedPdf {
    fn page_count(&self) -> usize;

    /// Text fragments of page `page` (1-indexed), in reading order.
    fn page_fragments(&self, page: usize) -> Result<Vec<String>, DocEditError>;
}

/// [`PdfBackend`] backed by pdfium-render.
///
/// The native library is bound on the first [`PdfBackend::load`] call, so
/// text-only runs never need pdfium installed.
pub struct PdfiumBackend {
    library: Option<PathBuf>,
    pdfium: OnceCell<Pdfium>,
}

impl Default for PdfiumBackend {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PdfiumBackend {
    /// Use `PDFIUM_LIB_PATH` when set, else the system library.
    pub fn from_env() -> Self {
        let library = std::env::var_os(PDFIUM_LIB_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self {
            library,
            pdfium: OnceCell::new(),
        }
    }

    /// Use a specific library file, or the platform library name inside a
    /// directory.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(path.into()),
            pdfium: OnceCell::new(),
        }
    }

    fn pdfium(&self) -> Result<&Pdfium, DocEditError> {
        self.pdfium.get_or_try_init(|| {
            let bindings = match self.library {
                Some(ref path) => {
                    let lib: PathBuf = if path.is_dir() {
                        Pdfium::pdfium_platform_library_name_at_path(path)
                    } else {
                        path.clone()
                    };
                    debug!("Binding pdfium from {}", lib.display());
                    Pdfium::bind_to_library(&lib).map_err(|e| {
                        DocEditError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e))
                    })?
                }
                None => Pdfium::bind_to_system_library()
                    .map_err(|e| DocEditError::PdfiumBindingFailed(format!("{:?}", e)))?,
            };
            Ok(Pdfium::new(bindings))
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn LoadedPdf + 'a>, DocEditError> {
        let document = self
            .pdfium()?
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| DocEditError::PdfParse {
                detail: format!("{:?}", e),
            })?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl LoadedPdf for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_fragments(&self, page: usize) -> Result<Vec<String>, DocEditError> {
        let total = self.page_count();
        if page == 0 || page > total {
            return Err(DocEditError::PdfParse {
                detail: format!("page {page} out of range (document has {total} pages)"),
            });
        }

        let pdf_page = self
            .document
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| DocEditError::PdfParse {
                detail: format!("page {page}: {:?}", e),
            })?;
        let text = pdf_page.text().map_err(|e| DocEditError::PdfParse {
            detail: format!("page {page} text layer: {:?}", e),
        })?;

        Ok(text
            .all()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
