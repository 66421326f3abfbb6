//! Error taxonomy for context resolution and record handling.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// No records exist for the document. Context resolution reports this as
    /// an empty result; only catalog operations (delete) surface it.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Target page is not an integer ≥ 1.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    /// A stored record could not be decoded. Stores skip these.
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// A configured heading grammar failed to compile.
    #[error("invalid heading grammar: {0}")]
    Grammar(String),
}
