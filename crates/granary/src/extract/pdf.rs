// ABOUTME: PDF extraction: filename sanitization and per-page text extraction via lopdf.
// ABOUTME: Decoded bytes are staged in a scoped temp file that is removed on every exit path.

use std::io::Write;

use lopdf::Document;
use tracing::debug;

use crate::error::PipelineError;

/// Fallback name when the caller supplies nothing usable.
const DEFAULT_FILENAME: &str = "document.pdf";

/// Reduce a supplied filename to a bare basename.
///
/// Path separators (both `/` and `\`) and traversal segments are stripped
/// before any filesystem use; `"../../etc/passwd"` becomes `"passwd"`.
/// Degenerate input falls back to a default name.
pub fn sanitize_filename(name: &str) -> String {
    name.split(['/', '\\'])
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Extract the text of a PDF byte stream.
///
/// Pages are read in order; a page yielding no text is skipped and the
/// surviving page texts are joined with a newline. Undecodable payloads and
/// documents with no extractable text at all are extraction failures.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::extraction(
            "ExtractPdf",
            Some(anyhow::anyhow!("empty PDF payload")),
        ));
    }

    // Stage the bytes in a named temp file; the handle removes it on drop,
    // success or failure.
    let mut staging = tempfile::NamedTempFile::new().map_err(|e| {
        PipelineError::extraction(
            "ExtractPdf",
            Some(anyhow::anyhow!("failed to create staging file: {}", e)),
        )
    })?;
    staging.write_all(bytes).and_then(|_| staging.flush()).map_err(|e| {
        PipelineError::extraction(
            "ExtractPdf",
            Some(anyhow::anyhow!("failed to write staging file: {}", e)),
        )
    })?;

    let doc = Document::load(staging.path()).map_err(|e| {
        PipelineError::extraction(
            "ExtractPdf",
            Some(anyhow::anyhow!("undecodable PDF payload: {}", e)),
        )
    })?;

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(PipelineError::extraction(
            "ExtractPdf",
            Some(anyhow::anyhow!("PDF has no pages")),
        ));
    }

    let mut page_texts = Vec::new();
    for &number in pages.keys() {
        match doc.extract_text(&[number]) {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    debug!(page = number, "skipping page with no text");
                } else {
                    page_texts.push(trimmed.to_string());
                }
            }
            Err(e) => {
                debug!(page = number, error = %e, "skipping unreadable page");
            }
        }
    }

    if page_texts.is_empty() {
        return Err(PipelineError::extraction(
            "ExtractPdf",
            Some(anyhow::anyhow!("PDF contains no extractable text")),
        ));
    }

    Ok(page_texts.join("\n"))
}
