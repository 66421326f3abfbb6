//! Record storage abstraction.
//!
//! The [`RecordStore`] trait is the only thing the core depends on for
//! persistence. Backends (JSON file, SQLite) live in the application crate;
//! [`memory::InMemoryStore`] serves tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes. Each
//! mutation is one critical section: readers never observe a partially
//! applied write, and two writers never lose each other's records.

pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use crate::error::ContextError;
use crate::models::Record;

/// Abstract record store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`append`](RecordStore::append) | Add records after all existing ones |
/// | [`load_all`](RecordStore::load_all) | Every record, in storage order |
/// | [`replace_all`](RecordStore::replace_all) | Atomically swap the full record set |
/// | [`take_document`](RecordStore::take_document) | Remove one document's records and return them |
/// | [`load_document`](RecordStore::load_document) | Records of one document, in storage order |
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn append(&self, records: &[Record]) -> Result<()>;

    async fn load_all(&self) -> Result<Vec<Record>>;

    async fn replace_all(&self, records: &[Record]) -> Result<()>;

    /// Remove every record of `doc_id` and return the removed records in
    /// storage order. Records of other documents are left exactly as stored.
    /// An unknown `doc_id` returns an empty vec and leaves the store untouched.
    async fn take_document(&self, doc_id: &str) -> Result<Vec<Record>>;

    /// Backends with an index on `doc_id` should override this.
    async fn load_document(&self, doc_id: &str) -> Result<Vec<Record>> {
        let mut records = self.load_all().await?;
        records.retain(|r| r.doc_id == doc_id);
        Ok(records)
    }
}

/// Decode a JSON array of records, skipping entries that are malformed.
///
/// The top-level value must be an array; anything else is an error because
/// it means the whole file is unusable, not one record.
pub fn decode_records(raw: &str) -> Result<Vec<Record>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).context("record file is not a JSON array")?;

    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let decoded = serde_json::from_value::<Record>(value)
            .map_err(|e| ContextError::MalformedRecord {
                index,
                reason: e.to_string(),
            })
            .and_then(|r| r.validate(index).map(|_| r));
        match decoded {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping record: {}", e),
        }
    }
    Ok(records)
}

/// Encode records as the pretty-printed JSON array the file store writes.
pub fn encode_records(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
