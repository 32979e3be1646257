//! Database repositories for the data access layer
//
// File metadata repository and its capability trait
pub mod file;
pub mod file_store;
//
// Incremental search predicate
pub mod predicate;

pub use file::FileRepository;
pub use file_store::FileStore;
pub use predicate::SearchPredicate;
