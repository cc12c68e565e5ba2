//! HTTP cache control module
//!
//! `ETag` generation and `If-None-Match` handling. Tags are derived from
//! file metadata (length and mtime) so bodies can stay streamed instead of
//! being buffered for hashing; they are weak validators.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a weak `ETag` from file metadata
pub fn metadata_etag(len: u64, modified: Option<SystemTime>) -> String {
    let mut hasher = DefaultHasher::new();
    len.hash(&mut hasher);
    if let Some(mtime) = modified {
        if let Ok(since_epoch) = mtime.duration_since(UNIX_EPOCH) {
            since_epoch.as_nanos().hash(&mut hasher);
        }
    }
    let v = hasher.finish();
    format!("W/\"{v:x}\"")
}

/// Check if the client's `If-None-Match` header matches the server's `ETag`
///
/// Handles single tags, comma-separated lists, and the `*` wildcard.
/// Returns true if matched (a 304 should be returned).
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}
