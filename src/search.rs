use anyhow::Result;

use pagetrail_core::models::SearchHit;
use pagetrail_core::search::{search, SearchRequest};
use pagetrail_core::store::RecordStore;

use crate::config::Config;
use crate::db;

/// Run a corpus search with the configured limits and highlighter.
///
/// Shared by the CLI and `GET /search`; `limit` is clamped to
/// `[1, search.max_limit]`.
pub async fn search_corpus(
    store: &dyn RecordStore,
    config: &Config,
    query: &str,
    doc_id: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<SearchHit>> {
    let req = SearchRequest {
        query,
        doc_id,
        top_k: config.clamp_limit(limit),
        min_term_len: config.query.min_term_len,
        snippet_window: config.search.snippet_window,
    };
    search(store, &req, &config.highlighter()).await
}

pub async fn run_search(
    config: &Config,
    query: &str,
    doc_id: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let store = db::open_store(config).await?;
    let hits = search_corpus(store.as_ref(), config, query, doc_id.as_deref(), limit).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{}] {} / page {}", i + 1, hit.score, hit.doc_name, hit.page);
        println!("    doc_id: {}", hit.doc_id);
        println!("    url: {}", hit.pdf_url);
        println!(
            "    excerpt: \"{}\"",
            hit.snippet.replace('\n', " ").trim()
        );
        println!("    id: {}", hit.chunk_id);
        println!();
    }

    Ok(())
}
