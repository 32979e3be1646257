//! Filevault Storage Library
//!
//! Object storage abstraction for uploaded chunks, with S3 and local
//! filesystem implementations.
//!
//! # Storage key format
//!
//! Every uploaded file owns a prefix and its chunks live underneath it:
//!
//! - **File prefix**: `files/{owner_id}/{file_id}`
//! - **Chunk**: `files/{owner_id}/{file_id}/chunk-{index:06}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filevault_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
