//! In-memory [`RecordStore`] implementation for tests and embedding.
//!
//! A single `RwLock<Vec<Record>>`: every mutation happens under one write
//! guard, so readers see either the old or the new record set.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::Record;

use super::RecordStore;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn append(&self, records: &[Record]) -> Result<()> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        stored.extend_from_slice(records);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Record>> {
        let stored = self
            .records
            .read()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        Ok(stored.clone())
    }

    async fn replace_all(&self, records: &[Record]) -> Result<()> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        *stored = records.to_vec();
        Ok(())
    }

    async fn take_document(&self, doc_id: &str) -> Result<Vec<Record>> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        let (taken, kept): (Vec<Record>, Vec<Record>) = std::mem::take(&mut *stored)
            .into_iter()
            .partition(|r| r.doc_id == doc_id);
        *stored = kept;
        Ok(taken)
    }
}
