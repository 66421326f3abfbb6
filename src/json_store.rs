//! JSON-file-backed [`RecordStore`] implementation.
//!
//! The whole corpus lives in one JSON array. Writes replace the file by
//! writing a temporary file next to it and renaming it into place, so a
//! reader sees either the old file or the new one.
//!
//! Every mutation is one read-modify-write held under two locks: the
//! in-process `write_lock` and an OS advisory lock on `<path>.lock`, so a
//! CLI command and a running server never overwrite each other's changes.
//! Mutations edit the raw array entries: entries that fail to decode,
//! unknown fields, and legacy `pdf_path` keys survive untouched.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use pagetrail_core::models::Record;
use pagetrail_core::store::{decode_records, encode_records, RecordStore};

type Entries = Vec<Box<RawValue>>;

pub struct JsonFileStore {
    path: Arc<PathBuf>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty array if the file does not exist yet.
    pub async fn ensure_exists(&self) -> Result<()> {
        self.locked(|path| {
            if path.exists() {
                return Ok(());
            }
            write_atomically(path, b"[]")
        })
        .await
    }

    /// Run `f` on a blocking thread while holding both write locks.
    async fn locked<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || {
            let _file_lock = lock_file(&path)?;
            f(&path)
        })
        .await?
    }

    /// Apply `edit` to the raw entries and write the file back if the number
    /// of entries changed.
    async fn edit_entries<T, F>(&self, edit: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Entries) -> Result<T> + Send + 'static,
    {
        self.locked(move |path| {
            let mut entries = read_entries(path)?;
            let before = entries.len();
            let out = edit(&mut entries)?;
            if entries.len() != before {
                debug!(path = %path.display(), entries = entries.len(), "writing record file");
                let encoded = serde_json::to_string_pretty(&entries)?;
                write_atomically(path, encoded.as_bytes())?;
            }
            Ok(out)
        })
        .await
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Block until this process holds the advisory lock next to `path`. The
/// lock is released when the returned file is dropped or the process exits.
fn lock_file(path: &Path) -> Result<File> {
    let lock_path = lock_path(path);
    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;
    file.lock()
        .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
    Ok(file)
}

fn read_entries(path: &Path) -> Result<Entries> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array", path.display()))
}

#[derive(Deserialize)]
struct EntryDoc {
    doc_id: Option<String>,
}

/// The `doc_id` of a raw entry, if it has a string one.
fn entry_doc_id(entry: &RawValue) -> Option<String> {
    serde_json::from_str::<EntryDoc>(entry.get())
        .ok()
        .and_then(|e| e.doc_id)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn append(&self, records: &[Record]) -> Result<()> {
        let added = records
            .iter()
            .map(serde_json::value::to_raw_value)
            .collect::<serde_json::Result<Entries>>()?;
        self.edit_entries(move |entries| {
            entries.extend(added);
            Ok(())
        })
        .await
    }

    async fn load_all(&self) -> Result<Vec<Record>> {
        match tokio::fs::read_to_string(self.path.as_path()).await {
            Ok(raw) => decode_records(&raw)
                .with_context(|| format!("Failed to decode {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        }
    }

    async fn replace_all(&self, records: &[Record]) -> Result<()> {
        let encoded = encode_records(records)?;
        self.locked(move |path| write_atomically(path, encoded.as_bytes()))
            .await
    }

    async fn take_document(&self, doc_id: &str) -> Result<Vec<Record>> {
        let doc_id = doc_id.to_string();
        let taken: Entries = self
            .edit_entries(move |entries| {
                let (taken, kept): (Entries, Entries) = std::mem::take(entries)
                    .into_iter()
                    .partition(|e| entry_doc_id(e).as_deref() == Some(doc_id.as_str()));
                *entries = kept;
                Ok(taken)
            })
            .await?;

        let raw = serde_json::to_string(&taken)?;
        decode_records(&raw)
    }
}
