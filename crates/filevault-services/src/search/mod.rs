//! File search with a fingerprint-keyed result cache.

pub mod cache;
pub mod fingerprint;
pub mod service;

pub use cache::{CacheError, InMemorySearchCache, SearchCache};
pub use fingerprint::{invalidate_owner, owner_pattern, search_cache_key};
pub use service::FileCatalog;
