use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::constants::MAX_FILE_NAME_LEN;
use crate::error::AppError;

/// Persisted metadata of a fully uploaded file.
///
/// `storage_key` and `chunk_count` locate the chunk objects for deletion and
/// are never rendered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub storage_url: String,
    #[serde(skip)]
    pub storage_key: String,
    #[serde(skip)]
    pub chunk_count: i32,
    pub upload_date: DateTime<Utc>,
}

/// Values for a new `files` row; `upload_date` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub storage_url: String,
    pub storage_key: String,
    pub chunk_count: i32,
}

/// Body returned after a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub url: String,
}

impl From<&FileRecord> for UploadResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            file_id: record.id,
            file_name: record.file_name.clone(),
            file_size: record.file_size,
            url: record.storage_url.clone(),
        }
    }
}

/// Request DTO for renaming a file
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenameFileRequest {
    #[validate(
        length(
            min = 1,
            max = 255,
            message = "File name must be between 1 and 255 characters"
        ),
        custom(function = "validate_file_name")
    )]
    pub name: String,
}

/// Checks the client-supplied name of an uploaded file.
pub fn check_upload_file_name(name: &str) -> Result<(), AppError> {
    if name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "File name must be at most {} characters",
            MAX_FILE_NAME_LEN
        )));
    }
    validate_file_name(name)
        .map_err(|e| AppError::InvalidInput(format!("Invalid file name: {}", e.code)))
}

/// Rejects blank names and names containing path separators.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank_file_name"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::new("file_name_contains_separator"));
    }
    Ok(())
}
