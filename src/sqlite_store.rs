//! SQLite-backed [`RecordStore`] implementation.
//!
//! One `records` table ordered by an autoincrement `seq` column. Batch
//! writes run inside a transaction and document removal is a single
//! `DELETE`, so readers never see half a mutation.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use pagetrail_core::models::Record;
use pagetrail_core::store::RecordStore;

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &SqliteRow) -> Record {
    let page: i64 = row.get("page");
    Record {
        id: row.get("id"),
        doc_id: row.get("doc_id"),
        doc_name: row.get("doc_name"),
        page: page as u32,
        text: row.get("text"),
        source_locator: row.get("source_locator"),
    }
}

async fn insert_all(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    records: &[Record],
) -> Result<()> {
    for record in records {
        sqlx::query(
            "INSERT INTO records (id, doc_id, doc_name, page, text, source_locator) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.doc_id)
        .bind(&record.doc_name)
        .bind(record.page as i64)
        .bind(&record.text)
        .bind(&record.source_locator)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn append(&self, records: &[Record]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_all(&mut tx, records).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            "SELECT id, doc_id, doc_name, page, text, source_locator FROM records ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn replace_all(&self, records: &[Record]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM records").execute(&mut *tx).await?;
        insert_all(&mut tx, records).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn take_document(&self, doc_id: &str) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            "DELETE FROM records WHERE doc_id = ? RETURNING seq, id, doc_id, doc_name, page, text, source_locator",
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await?;

        // RETURNING order is unspecified
        let mut taken: Vec<(i64, Record)> = rows
            .iter()
            .map(|row| (row.get("seq"), row_to_record(row)))
            .collect();
        taken.sort_by_key(|(seq, _)| *seq);
        Ok(taken.into_iter().map(|(_, record)| record).collect())
    }

    async fn load_document(&self, doc_id: &str) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            "SELECT id, doc_id, doc_name, page, text, source_locator FROM records WHERE doc_id = ? ORDER BY seq ASC",
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}
