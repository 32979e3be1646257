use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filevault_core::models::{FileRecord, NewFileRecord};
use filevault_core::AppError;
use uuid::Uuid;

use crate::db::predicate::SearchPredicate;

/// Trait for file metadata operations
/// This abstracts the relational store so services can run against test doubles
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert one record; the store assigns `upload_date`.
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Run a search predicate, newest first.
    async fn query(&self, predicate: &SearchPredicate) -> Result<Vec<FileRecord>, AppError>;

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Returns the updated record, or `None` when the owner has no such file.
    async fn update_file_name(
        &self,
        owner_id: Uuid,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Records uploaded strictly before `cutoff`, across all owners.
    async fn list_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), AppError>;
}
