//! Cache keys for search results.
//!
//! Layout: `file_search:{owner_id}:{sha256(name, date, limit, offset)}`. Keeping
//! the owner in clear text lets a single pattern drop one owner's entries.

use filevault_core::constants::SEARCH_CACHE_PREFIX;
use filevault_core::SearchParams;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::cache::SearchCache;

// Unit separator; cannot appear in a trimmed query parameter by accident.
const FIELD_SEPARATOR: u8 = 0x1f;

pub fn search_cache_key(owner_id: Uuid, params: &SearchParams) -> String {
    let date = params
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(params.name.as_deref().unwrap_or_default().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(date.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(params.limit.to_string().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(params.offset.to_string().as_bytes());

    format!(
        "{}:{}:{}",
        SEARCH_CACHE_PREFIX,
        owner_id,
        hex::encode(hasher.finalize())
    )
}

/// Pattern matching every cached search of one owner.
pub fn owner_pattern(owner_id: Uuid) -> String {
    format!("{}:{}:*", SEARCH_CACHE_PREFIX, owner_id)
}

/// Drop every cached search of `owner_id`.
///
/// Failures are logged only: stale entries still expire with their TTL.
pub async fn invalidate_owner(cache: &dyn SearchCache, owner_id: Uuid) {
    match cache.delete_matching(&owner_pattern(owner_id)).await {
        Ok(removed) => {
            tracing::debug!(owner_id = %owner_id, removed, "Invalidated cached searches");
        }
        Err(e) => {
            tracing::warn!(owner_id = %owner_id, error = %e, "Failed to invalidate cached searches");
        }
    }
}
