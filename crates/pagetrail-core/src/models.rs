//! Core data models shared by every pagetrail component.
//!
//! A [`Record`] is the unit of storage: one slice of one page of one
//! document. Records for the same `(doc_id, page)` concatenated in storage
//! order form that page's full text.

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// A stored slice of extracted page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub doc_id: String,
    pub doc_name: String,
    /// 1-based physical page number, stable for the lifetime of the document.
    pub page: u32,
    /// Raw extracted text; may contain embedded line breaks.
    pub text: String,
    /// File name of the source document inside the documents directory.
    #[serde(alias = "pdf_path")]
    pub source_locator: String,
}

impl Record {
    /// Rejects records that decode but violate the page invariant.
    pub fn validate(&self, index: usize) -> Result<(), ContextError> {
        if self.page == 0 {
            return Err(ContextError::MalformedRecord {
                index,
                reason: "page must be >= 1".to_string(),
            });
        }
        if self.doc_id.is_empty() {
            return Err(ContextError::MalformedRecord {
                index,
                reason: "doc_id is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// A validated, 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageNumber(u32);

impl PageNumber {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Parses untrusted input such as a query-string value.
    pub fn parse(raw: &str) -> Result<Self, ContextError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ContextError::InvalidPage(format!("'{}' is not an integer", raw)))?;
        Self::try_from(value)
    }
}

impl TryFrom<i64> for PageNumber {
    type Error = ContextError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 1 || value > u32::MAX as i64 {
            return Err(ContextError::InvalidPage(format!(
                "{} is out of range (pages start at 1)",
                value
            )));
        }
        Ok(PageNumber(value as u32))
    }
}

impl std::fmt::Display for PageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural context for one matched location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextResponse {
    /// Heading texts ordered chapter → section → subsection.
    pub breadcrumb: Vec<String>,
    /// Highlighted paragraph from the target page.
    pub paragraph: String,
    pub page: u32,
}

impl ContextResponse {
    pub fn empty(page: u32) -> Self {
        Self {
            breadcrumb: Vec::new(),
            paragraph: String::new(),
            page,
        }
    }
}

/// A ranked corpus-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub doc_id: String,
    pub doc_name: String,
    pub page: u32,
    /// Excerpt with highlight markers around query terms.
    pub snippet: String,
    /// Link to the source file, opened at the hit's page.
    pub pdf_url: String,
    /// Raw term-occurrence count.
    pub score: u64,
}

/// One entry of the document listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    pub doc_name: String,
    pub chunk_count: usize,
    pub page_count: usize,
}
