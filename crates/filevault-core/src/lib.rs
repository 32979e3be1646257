//! Filevault Core Library
//!
//! This crate provides core domain models, error types and configuration
//! that are shared across all Filevault components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, FilevaultConfig, ServerConfig, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    check_upload_file_name, Chunk, FileRecord, NewFileRecord, RenameFileRequest, SearchParams,
    UploadResponse, UploadSession, UploadStatus,
};
pub use storage_types::StorageBackend;
// Note: Storage and StorageError live in filevault-storage
