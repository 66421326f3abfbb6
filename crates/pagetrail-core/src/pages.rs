//! Page reassembly.
//!
//! Records are grouped by page number and concatenated with `\n` in storage
//! order. Pages without records are absent from the map, never empty
//! strings; a document with no records yields an empty map, which callers
//! treat as "no context available".

use std::collections::BTreeMap;

use anyhow::Result;

use crate::models::Record;
use crate::store::RecordStore;

/// Page number → full page text, ascending.
pub type Pages = BTreeMap<u32, String>;

/// Group one document's records into pages, keeping pages `<= last_page`
/// when a bound is given.
pub fn group_pages(records: &[Record], doc_id: &str, last_page: Option<u32>) -> Pages {
    let mut grouped: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
    for record in records {
        if record.doc_id != doc_id || record.page == 0 {
            continue;
        }
        if last_page.is_some_and(|last| record.page > last) {
            continue;
        }
        grouped
            .entry(record.page)
            .or_default()
            .push(record.text.as_str());
    }
    grouped
        .into_iter()
        .map(|(page, texts)| (page, texts.join("\n")))
        .collect()
}

/// Every page of a document.
pub async fn pages_for<S: RecordStore + ?Sized>(store: &S, doc_id: &str) -> Result<Pages> {
    let records = store.load_document(doc_id).await?;
    Ok(group_pages(&records, doc_id, None))
}

/// Pages `1..=last_page` of a document; later pages are never assembled.
pub async fn pages_up_to<S: RecordStore + ?Sized>(
    store: &S,
    doc_id: &str,
    last_page: u32,
) -> Result<Pages> {
    let records = store.load_document(doc_id).await?;
    Ok(group_pages(&records, doc_id, Some(last_page)))
}
