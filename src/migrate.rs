use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::{Config, StoreBackend};
use crate::db;
use crate::json_store::JsonFileStore;

/// Create an empty store and the documents directory.
///
/// Idempotent: an existing store keeps its records.
pub async fn run_init(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.documents.dir)?;

    match config.store.backend {
        StoreBackend::Json => {
            JsonFileStore::new(&config.store.path).ensure_exists().await?;
        }
        StoreBackend::Sqlite => {
            let pool = db::connect(&config.store.path).await?;
            create_schema(&pool).await?;
            pool.close().await;
        }
    }
    Ok(())
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // `seq` preserves append order, which page reassembly depends on.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            doc_name TEXT NOT NULL,
            page INTEGER NOT NULL CHECK (page >= 1),
            text TEXT NOT NULL,
            source_locator TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_doc_id ON records(doc_id, seq)")
        .execute(pool)
        .await?;

    Ok(())
}
