//! Corpus keyword search.
//!
//! A linear scan over every stored record: the score is the summed count of
//! each lowercase query term as a substring of the record's lowercase text.
//! There is no index, which is fine for tens of documents with a few hundred
//! pages each.
//!
//! # Ranking
//!
//! 1. Tokenize the query (see [`crate::query::tokenize`]).
//! 2. Drop records outside the `doc_id` filter.
//! 3. Score each record; drop zero scores.
//! 4. Stable sort by score (desc): equal scores keep storage order.
//! 5. Truncate to `top_k`.

use anyhow::Result;

use crate::highlight::Highlighter;
use crate::models::{Record, SearchHit};
use crate::query::{term_frequency, tokenize};
use crate::store::RecordStore;

/// Inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    /// Only return records from this document.
    pub doc_id: Option<&'a str>,
    pub top_k: usize,
    pub min_term_len: usize,
    /// Snippet length in characters.
    pub snippet_window: usize,
}

/// A record paired with its raw score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRecord<'a> {
    pub record: &'a Record,
    pub score: u64,
}

/// Score and rank `records` against pre-tokenized `terms`.
pub fn score_records<'a>(
    records: &'a [Record],
    terms: &[String],
    doc_id: Option<&str>,
    top_k: usize,
) -> Vec<ScoredRecord<'a>> {
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredRecord<'a>> = records
        .iter()
        .filter(|r| doc_id.map_or(true, |d| r.doc_id == d))
        .filter_map(|record| {
            let score = term_frequency(&record.text, terms);
            (score > 0).then_some(ScoredRecord { record, score })
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(top_k);
    scored
}

/// Link to a source file opened at `page`.
pub fn pdf_url(source_locator: &str, page: u32) -> String {
    format!("/pdfs/{}#page={}", source_locator, page)
}

/// Run a keyword search against a [`RecordStore`] backend.
///
/// This is the function every frontend (CLI, HTTP) delegates to.
pub async fn search<S: RecordStore + ?Sized>(
    store: &S,
    req: &SearchRequest<'_>,
    highlighter: &Highlighter,
) -> Result<Vec<SearchHit>> {
    let terms = tokenize(req.query, req.min_term_len);
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let records = match req.doc_id {
        Some(doc_id) => store.load_document(doc_id).await?,
        None => store.load_all().await?,
    };

    Ok(score_records(&records, &terms, req.doc_id, req.top_k)
        .into_iter()
        .map(|hit| SearchHit {
            chunk_id: hit.record.id.clone(),
            doc_id: hit.record.doc_id.clone(),
            doc_name: hit.record.doc_name.clone(),
            page: hit.record.page,
            snippet: highlighter.snippet(&hit.record.text, &terms, req.snippet_window),
            pdf_url: pdf_url(&hit.record.source_locator, hit.record.page),
            score: hit.score,
        })
        .collect())
}
