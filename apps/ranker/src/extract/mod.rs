//! Document Parsers: turn a CV file on disk into raw text.
//!
//! Every format-specific extractor returns `Result<String, ExtractError>`.
//! [`DocumentExtractor::extract_text`] is the only public boundary and collapses any failure
//! to an empty string after logging it, so callers never see an extraction error.

pub mod docx;
#[cfg(feature = "ocr")]
pub mod ocr_backend;
pub mod pdf;
pub mod raster;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

pub use raster::{OcrEngine, OcrLine};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf extraction failed: {0}")]
    Pdf(String),

    #[error("docx archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("docx xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("ocr failed: {0}")]
    Ocr(String),

    #[error("no OCR engine configured")]
    OcrUnavailable,

    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// File formats the parsers know about, decided purely by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    WordProcessor,
    RasterImage,
    Unsupported,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") => DocumentKind::WordProcessor,
            Some("png" | "jpg" | "jpeg") => DocumentKind::RasterImage,
            _ => DocumentKind::Unsupported,
        }
    }

    pub fn is_supported(self) -> bool {
        self != DocumentKind::Unsupported
    }
}

/// Dispatches a path to the matching extractor.
///
/// Holds the OCR engine (if any) that was constructed at startup.
#[derive(Clone, Default)]
pub struct DocumentExtractor {
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl DocumentExtractor {
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { ocr }
    }

    /// Returns the raw text of the document, or `""` if it cannot be read.
    pub fn extract_text(&self, path: &Path) -> String {
        match self.try_extract(path) {
            Ok(text) => {
                debug!("Extracted {} chars from {:?}", text.len(), path);
                text
            }
            Err(ExtractError::Unsupported(ext)) => {
                debug!("Skipping {:?}: unsupported extension '{ext}'", path);
                String::new()
            }
            Err(e) => {
                warn!("Text extraction failed for {:?}: {e}", path);
                String::new()
            }
        }
    }

    /// Same dispatch as [`extract_text`](Self::extract_text) but keeps the failure reason.
    pub fn try_extract(&self, path: &Path) -> Result<String, ExtractError> {
        match DocumentKind::from_path(path) {
            DocumentKind::Pdf => pdf::extract_pdf_text(path),
            DocumentKind::WordProcessor => docx::extract_docx_text(path),
            DocumentKind::RasterImage => match &self.ocr {
                Some(engine) => raster::extract_image_text(engine.as_ref(), path),
                None => Err(ExtractError::OcrUnavailable),
            },
            DocumentKind::Unsupported => Err(ExtractError::Unsupported(
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or_default()
                    .to_string(),
            )),
        }
    }
}
