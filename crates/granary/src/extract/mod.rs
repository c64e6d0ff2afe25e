// ABOUTME: Extractor stage: drives the Document Capability output into a loosely-typed payload.
// ABOUTME: html.rs reads the rendered page; pdf.rs sanitizes filenames and pulls per-page text.

pub mod html;
pub mod pdf;

use crate::record::RawExtraction;

pub use html::extract_page;
pub use pdf::{extract_pdf_text, sanitize_filename};

/// Output of the extraction stage, one variant per source kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Loosely-typed payload read from a rendered page.
    Page(RawExtraction),
    /// Concatenated text pulled from a PDF, plus the sanitized filename.
    PdfText { filename: String, text: String },
}
