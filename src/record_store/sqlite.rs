use super::{ensure_storable, RecordQuery, RecordStore, StoreError};
use crate::record::{Collection, Fields, Record, RecordId};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

/// Record store keeping each document as a JSON body in SQLite.
///
/// The `seq` column preserves insertion order so repeated queries return
/// the same sequence.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (creating if needed) the database file and its table
    pub async fn new(database_path: &str) -> Result<Self, StoreError> {
        // Use sqlite:// with ?mode=rwc to create if it doesn't exist
        let database_url = format!("sqlite://{}?mode=rwc", database_path);
        info!("Connecting to {}", database_url);
        let pool = SqlitePool::connect(&database_url).await?;

        let store = SqliteRecordStore { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<Record, StoreError> {
        let id: String = row.get("id");
        let body: String = row.get("body");
        let fields: Fields = serde_json::from_str(&body)?;
        Ok(Record::new(RecordId::new(id), fields))
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create(
        &self,
        collection: Collection,
        fields: &Fields,
    ) -> Result<RecordId, StoreError> {
        ensure_storable(fields)?;
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(fields)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!("Created {}/{}", collection, id);
        Ok(RecordId::new(id))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        fields: &Fields,
    ) -> Result<(), StoreError> {
        ensure_storable(fields)?;
        let body = serde_json::to_string(fields)?;

        let result = sqlx::query(
            "UPDATE documents SET body = ?, updated_at = ? WHERE collection = ? AND id = ?",
        )
        .bind(&body)
        .bind(Utc::now().to_rfc3339())
        .bind(collection.as_str())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.clone(),
            });
        }

        debug!("Updated {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        debug!("Deleted {}/{}", collection, id);
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY seq")
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;

        // The range predicate is applied here rather than in SQL so case
        // folding matches the in-memory store exactly.
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = Self::row_to_record(row)?;
            if query.matches(&record.fields) {
                records.push(record);
            }
        }

        Ok(records)
    }

    async fn get(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}
