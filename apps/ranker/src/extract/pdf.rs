//! PDF text extraction via pdf-extract.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::debug;

use super::ExtractError;

/// Extracts the text of every page, newline-joined. Blank pages contribute nothing.
pub fn extract_pdf_text(path: &Path) -> Result<String, ExtractError> {
    debug!("Extracting PDF: {:?}", path);

    let bytes = std::fs::read(path)?;

    // pdf-extract panics on some malformed inputs; treat that as an ordinary failure.
    let text = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(&bytes)
    }))
    .map_err(|_| ExtractError::Pdf("parser panicked".to_string()))?
    .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(join_pages(&text))
}

/// pdf-extract separates pages with form feeds.
fn join_pages(text: &str) -> String {
    text.split('\u{c}')
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
