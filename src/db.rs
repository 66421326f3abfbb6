//! Store construction.
//!
//! Opens the backend named by `[store] backend` and hands it out as a
//! shared [`RecordStore`] trait object.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use pagetrail_core::store::RecordStore;

use crate::config::{Config, StoreBackend};
use crate::json_store::JsonFileStore;
use crate::sqlite_store::SqliteRecordStore;

pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open the configured record store.
///
/// The SQLite schema is created on open, so `ptrail init` is only needed
/// to create an empty store ahead of time.
pub async fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Json => Ok(Arc::new(JsonFileStore::new(&config.store.path))),
        StoreBackend::Sqlite => {
            let pool = connect(&config.store.path).await?;
            crate::migrate::create_schema(&pool).await?;
            Ok(Arc::new(SqliteRecordStore::new(pool)))
        }
    }
}
