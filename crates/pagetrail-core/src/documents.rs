//! Document listing and removal.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use tracing::info;

use crate::error::ContextError;
use crate::models::{DocumentSummary, Record};
use crate::store::RecordStore;

/// One summary per distinct `doc_id`, in order of first appearance.
pub fn summarize(records: &[Record]) -> Vec<DocumentSummary> {
    let mut order: Vec<DocumentSummary> = Vec::new();
    let mut pages: Vec<BTreeSet<u32>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.doc_id.as_str()).or_insert_with(|| {
            order.push(DocumentSummary {
                doc_id: record.doc_id.clone(),
                doc_name: record.doc_name.clone(),
                chunk_count: 0,
                page_count: 0,
            });
            pages.push(BTreeSet::new());
            order.len() - 1
        });
        order[slot].chunk_count += 1;
        pages[slot].insert(record.page);
    }

    for (summary, seen) in order.iter_mut().zip(pages) {
        summary.page_count = seen.len();
    }
    order
}

pub async fn list_documents<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<DocumentSummary>> {
    Ok(summarize(&store.load_all().await?))
}

/// What [`remove_document`] took out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedDocument {
    pub doc_id: String,
    pub deleted_chunks: usize,
    /// Distinct source file names the removed records pointed at.
    pub source_locators: Vec<String>,
}

/// Drop every record of `doc_id` in one [`RecordStore::take_document`] call.
///
/// Fails with [`ContextError::DocumentNotFound`] when the document has no
/// records; the store is not rewritten in that case.
pub async fn remove_document<S: RecordStore + ?Sized>(
    store: &S,
    doc_id: &str,
) -> Result<RemovedDocument> {
    let removed = store.take_document(doc_id).await?;
    if removed.is_empty() {
        return Err(ContextError::DocumentNotFound(doc_id.to_string()).into());
    }

    info!(doc_id, deleted = removed.len(), "document removed");

    let mut source_locators: Vec<String> = Vec::new();
    for record in &removed {
        if !source_locators.contains(&record.source_locator) {
            source_locators.push(record.source_locator.clone());
        }
    }

    Ok(RemovedDocument {
        doc_id: doc_id.to_string(),
        deleted_chunks: removed.len(),
        source_locators,
    })
}
