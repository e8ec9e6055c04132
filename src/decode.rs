//! Source-document decoding: per-page plain text out of a PDF.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Extract one text string per page, in document order. Pages with no
/// extractable text come back as empty strings and are kept so that page
/// numbering stays aligned with the source document.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        anyhow::bail!("input file not found: {}", path.display());
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        anyhow::bail!("unsupported input type, expected a .pdf file: {}", path.display());
    }

    info!(path = %path.display(), "decoding source document");
    let pages = pdf_extract::extract_text_by_pages(path)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let empty = pages.iter().filter(|p| p.trim().is_empty()).count();
    if empty > 0 {
        warn!(empty, total = pages.len(), "pages without extractable text (scanned images?)");
    }
    info!(pages = pages.len(), "document decoded");

    Ok(pages)
}
