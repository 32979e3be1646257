use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("invalid cache key pattern: {0}")]
    InvalidPattern(String),
}

/// Key/value cache with per-entry expiry and glob deletion.
///
/// Safe for concurrent use; no operation spans more than one call.
/// Invalidation reaches only the instances sharing the backing store:
/// `InMemorySearchCache` is per process, so with several API instances each
/// one can serve stale results until the TTL expires.
#[async_trait]
pub trait SearchCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every key matching a glob pattern where `*` matches any run of
    /// characters. Returns the number of removed entries.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError>;
}

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct CachedEntry {
    value: String,
    expires_at: Instant,
}

struct CacheState {
    entries: HashMap<String, CachedEntry>,
    next_sweep: Instant,
}

/// Process-local cache used when no shared cache is deployed.
///
/// Expired entries are dropped on read, and the whole map is swept for
/// expired entries at most once per sweep interval, on write.
#[derive(Clone)]
pub struct InMemorySearchCache {
    state: Arc<RwLock<CacheState>>,
    sweep_interval: Duration,
}

impl Default for InMemorySearchCache {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl InMemorySearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState {
                entries: HashMap::new(),
                next_sweep: Instant::now() + sweep_interval,
            })),
            sweep_interval,
        }
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.state
            .read()
            .await
            .entries
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SearchCache for InMemorySearchCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            match state.entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it so the map does not grow with dead entries.
        let mut state = self.state.write().await;
        if state.entries.get(key).is_some_and(|e| e.expires_at <= now) {
            state.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut state = self.state.write().await;
        if now >= state.next_sweep {
            state.entries.retain(|_, e| e.expires_at > now);
            state.next_sweep = now + self.sweep_interval;
        }
        state.entries.insert(
            key.to_string(),
            CachedEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        if pattern.is_empty() {
            return Err(CacheError::InvalidPattern("empty pattern".to_string()));
        }

        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - state.entries.len()) as u64)
    }
}

/// `*`-only glob matching.
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return false;
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No `*` at all: exact match.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
