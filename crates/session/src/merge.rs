//! Session merge protocol
//!
//! Last-write-wins per key, not per session: keys in `updates` replace the
//! same keys in `existing`, every other existing key is carried over. There
//! is no way to delete a key through a merge.

use crate::payload::SessionPayload;

/// Merge `updates` over `existing`, treating an absent session as empty.
pub fn merge(existing: Option<&SessionPayload>, updates: &SessionPayload) -> SessionPayload {
    let mut merged = existing.cloned().unwrap_or_default().into_inner();
    for (key, value) in updates.iter() {
        merged.insert(key.to_string(), value.to_string());
    }
    SessionPayload::from_iter(merged)
}
