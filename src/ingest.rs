//! PDF ingestion pipeline.
//!
//! bytes → source file on disk → page texts → records → store.
//!
//! Each accepted document gets a fresh UUID. Its bytes are saved as
//! `<documents.dir>/<doc_id>.pdf` before extraction, and removed again if
//! extraction or the store append fails, so a failed ingest leaves neither
//! records nor an orphaned file behind.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use pagetrail_core::models::Record;
use pagetrail_core::store::RecordStore;

use crate::config::Config;
use crate::db;
use crate::extract::{extract_pages, is_pdf_name};

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub doc_id: String,
    pub doc_name: String,
    pub records_indexed: usize,
    pub pages_indexed: usize,
}

/// Split a page into pieces of at most `max_chars` characters on line
/// boundaries. Joining the pieces with `\n` gives back `text` exactly.
///
/// A single line longer than `max_chars` becomes its own oversized piece.
pub fn split_page(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    let mut started = false;

    for line in text.split('\n') {
        let line_chars = line.chars().count();
        if started && current_chars + 1 + line_chars > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
            started = false;
        }
        if started {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(line);
        current_chars += line_chars;
        started = true;
    }
    if started {
        pieces.push(current);
    }

    pieces
}

/// Turn extracted page texts into records. Pages are numbered from 1;
/// whitespace-only pages are skipped but still consume their number.
pub fn build_records(
    doc_id: &str,
    doc_name: &str,
    source_locator: &str,
    pages: &[String],
    max_record_chars: usize,
) -> Vec<Record> {
    let mut records = Vec::new();
    for (index, text) in pages.iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let page = index as u32 + 1;
        for piece in split_page(text, max_record_chars) {
            records.push(Record {
                id: Uuid::new_v4().to_string(),
                doc_id: doc_id.to_string(),
                doc_name: doc_name.to_string(),
                page,
                text: piece,
                source_locator: source_locator.to_string(),
            });
        }
    }
    records
}

/// Save, extract, and index one PDF.
pub async fn ingest_pdf(
    store: &dyn RecordStore,
    config: &Config,
    bytes: Vec<u8>,
    doc_name: &str,
) -> Result<IngestReport> {
    if !is_pdf_name(doc_name) {
        bail!("Only PDF files accepted: {}", doc_name);
    }

    let doc_id = Uuid::new_v4().to_string();
    let source_locator = format!("{}.pdf", doc_id);
    let pdf_path = config.documents.dir.join(&source_locator);

    tokio::fs::create_dir_all(&config.documents.dir)
        .await
        .with_context(|| format!("Failed to create {}", config.documents.dir.display()))?;
    tokio::fs::write(&pdf_path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", pdf_path.display()))?;

    match index_saved_pdf(store, config, bytes, &doc_id, doc_name, &source_locator).await {
        Ok(report) => Ok(report),
        Err(e) => {
            warn!(doc_name, "ingest failed, removing {}: {:#}", pdf_path.display(), e);
            let _ = tokio::fs::remove_file(&pdf_path).await;
            Err(e)
        }
    }
}

async fn index_saved_pdf(
    store: &dyn RecordStore,
    config: &Config,
    bytes: Vec<u8>,
    doc_id: &str,
    doc_name: &str,
    source_locator: &str,
) -> Result<IngestReport> {
    let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes)).await??;

    let records = build_records(
        doc_id,
        doc_name,
        source_locator,
        &pages,
        config.ingest.max_record_chars,
    );
    let pages_indexed = pages.iter().filter(|p| !p.trim().is_empty()).count();
    if records.is_empty() {
        warn!(doc_name, "no extractable text; document has no records");
    }

    store.append(&records).await?;
    info!(
        doc_id,
        doc_name,
        records = records.len(),
        pages = pages_indexed,
        "document indexed"
    );

    Ok(IngestReport {
        doc_id: doc_id.to_string(),
        doc_name: doc_name.to_string(),
        records_indexed: records.len(),
        pages_indexed,
    })
}

/// Collect PDFs under `root` matching the include globs, sorted by path.
pub fn collect_pdfs(root: &Path, include_globs: &[String]) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(include_globs)?;
    let mut found = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if include_set.is_match(&rel_str) && is_pdf_name(&rel_str) {
            found.push(path.to_path_buf());
        }
    }

    found.sort();
    Ok(found)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `ptrail add <path>`: index one PDF or every PDF under a directory.
pub async fn run_add(config: &Config, path: &Path, name: Option<String>) -> Result<()> {
    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }

    let files = if path.is_dir() {
        if name.is_some() {
            bail!("--name can only be used when adding a single file");
        }
        collect_pdfs(path, &config.ingest.include_globs)?
    } else {
        let display_name = name.clone().unwrap_or_else(|| file_name(path));
        if !is_pdf_name(&file_name(path)) || !is_pdf_name(&display_name) {
            bail!("Only PDF files accepted: {}", path.display());
        }
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        println!("No PDF files found under {}.", path.display());
        return Ok(());
    }

    let store = db::open_store(config).await?;
    let mut documents = 0usize;
    let mut records = 0usize;

    for file in &files {
        let doc_name = match &name {
            Some(n) => n.clone(),
            None => file_name(file),
        };
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;

        let report = ingest_pdf(store.as_ref(), config, bytes, &doc_name)
            .await
            .with_context(|| format!("Failed to ingest {}", file.display()))?;

        println!("added {}", report.doc_name);
        println!("  doc_id: {}", report.doc_id);
        println!("  pages indexed: {}", report.pages_indexed);
        println!("  records written: {}", report.records_indexed);
        documents += 1;
        records += report.records_indexed;
    }

    if files.len() > 1 {
        println!("{} documents, {} records", documents, records);
    }
    println!("ok");
    Ok(())
}
