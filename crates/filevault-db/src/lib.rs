//! Filevault Database Layer
//!
//! Persistence of file metadata in PostgreSQL, exposed to the services
//! through the `FileStore` trait.

pub mod db;

pub use db::{FileRepository, FileStore, SearchPredicate};
