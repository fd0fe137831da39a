//! Distributed cache key layout
//!
//! - `context:<channel_id>`: whole entry when it fits in one value
//! - `context:<channel_id>:chunk:<i>`: one slice of an oversized entry
//! - `context:<channel_id>:meta`: `{"chunks": n, "total_messages": m}`

use history_core::Snowflake;

/// Key prefix for per-channel transcript windows
pub const CONTEXT_PREFIX: &str = "context:";

/// Base key for a channel's window
pub fn context_key(channel_id: Snowflake) -> String {
    format!("{CONTEXT_PREFIX}{channel_id}")
}

/// Key of chunk `index` under `base`
pub fn chunk_key(base: &str, index: usize) -> String {
    format!("{base}:chunk:{index}")
}

/// Metadata key under `base`
pub fn meta_key(base: &str) -> String {
    format!("{base}:meta")
}
