//! Page-by-page PDF text extraction.
//!
//! Returns one string per physical page, in page order. Page numbering and
//! the dropping of blank pages happen in [`crate::ingest`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("not a PDF file: {0}")]
    NotPdf(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// True when `name` carries a `.pdf` extension (any case).
pub fn is_pdf_name(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractError::NotPdf("missing %PDF header".to_string()));
    }
    pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}
