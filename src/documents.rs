//! Document listing and deletion.
//!
//! Deletion removes the records first and the source files second: a
//! leftover file is harmless, a record pointing at a missing file is not.

use anyhow::Result;
use tracing::warn;

use pagetrail_core::documents::{list_documents, remove_document, RemovedDocument};
use pagetrail_core::store::RecordStore;

use crate::config::Config;
use crate::db;

/// Remove a document's records and its source file(s).
pub async fn delete_document(
    store: &dyn RecordStore,
    config: &Config,
    doc_id: &str,
) -> Result<RemovedDocument> {
    let removed = remove_document(store, doc_id).await?;

    for locator in &removed.source_locators {
        let path = config.documents.dir.join(locator);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

pub async fn run_documents(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let docs = list_documents(store.as_ref()).await?;

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!("{:<38} {:>7} {:>7}  NAME", "DOC_ID", "PAGES", "CHUNKS");
    for doc in &docs {
        println!(
            "{:<38} {:>7} {:>7}  {}",
            doc.doc_id, doc.page_count, doc.chunk_count, doc.doc_name
        );
    }
    println!();
    println!("{} documents", docs.len());

    Ok(())
}

pub async fn run_delete(config: &Config, doc_id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let removed = delete_document(store.as_ref(), config, doc_id).await?;

    println!("deleted {}", removed.doc_id);
    println!("  chunks removed: {}", removed.deleted_chunks);
    println!("ok");
    Ok(())
}
