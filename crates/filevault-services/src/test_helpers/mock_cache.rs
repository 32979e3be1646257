use std::time::Duration;

use async_trait::async_trait;

use crate::search::{CacheError, SearchCache};

/// Cache whose every operation fails, as when the cache server is down.
#[derive(Clone, Copy, Default)]
pub struct FailingCache;

#[async_trait]
impl SearchCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}
