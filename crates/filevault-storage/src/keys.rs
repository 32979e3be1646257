//! Shared key generation for storage backends.

use uuid::Uuid;

/// Prefix under which every chunk of one file is stored.
pub fn file_prefix(owner_id: Uuid, file_id: Uuid) -> String {
    format!("files/{}/{}", owner_id, file_id)
}

/// Key of a single chunk below a file prefix. Indices are zero-padded so a
/// lexical listing returns chunks in stream order.
pub fn chunk_key(prefix: &str, index: u64) -> String {
    format!("{}/chunk-{:06}", prefix.trim_end_matches('/'), index)
}
