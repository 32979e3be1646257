use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filevault_core::models::{FileRecord, NewFileRecord};
use filevault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::db::file_store::FileStore;
use crate::db::predicate::{SearchPredicate, FILE_COLUMNS};

/// Repository for file metadata backed by the shared connection pool
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", db.record_id = %record.id))]
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO files (id, owner_id, file_name, file_size, storage_url, storage_key, chunk_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let file = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(record.id)
            .bind(record.owner_id)
            .bind(&record.file_name)
            .bind(record.file_size)
            .bind(&record.storage_url)
            .bind(&record.storage_key)
            .bind(record.chunk_count)
            .fetch_one(&self.pool)
            .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self, predicate), fields(db.table = "files", db.operation = "select", owner_id = %predicate.owner_id))]
    async fn query(&self, predicate: &SearchPredicate) -> Result<Vec<FileRecord>, AppError> {
        let mut qb = predicate.build_query();
        let files = qb
            .build_query_as::<FileRecord>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = files.len(), "File search executed");

        Ok(files)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM files WHERE owner_id = $1 AND id = $2",
            FILE_COLUMNS
        );

        let file = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    async fn update_file_name(
        &self,
        owner_id: Uuid,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let sql = format!(
            "UPDATE files SET file_name = $3 WHERE owner_id = $1 AND id = $2 RETURNING {}",
            FILE_COLUMNS
        );

        let file = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(owner_id)
            .bind(id)
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn list_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM files WHERE upload_date < $1 ORDER BY upload_date ASC",
            FILE_COLUMNS
        );

        let files = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
