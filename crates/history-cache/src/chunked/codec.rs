//! Greedy byte-bounded packing of a list into JSON array chunks.
//!
//! Each chunk is a complete JSON array, so a chunk can be decoded on its own
//! and concatenating the decoded chunks in index order yields the original list.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::CacheResult;

/// Serialize `items` into JSON arrays of at most `max_bytes` bytes each.
///
/// Items are packed in order; a new chunk starts when adding the next item
/// would push the current one over the limit. An item fits only when its
/// one-element array `[item]` is within `max_bytes`; an item that does not
/// fit gets an oversized chunk of its own. An empty list yields no chunks.
pub fn split<T: Serialize>(items: &[T], max_bytes: usize) -> CacheResult<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current = String::from("[");

    for item in items {
        let encoded = serde_json::to_string(item)?;
        let is_empty = current.len() == 1;
        // current + separator + item + closing bracket
        let projected = current.len() + usize::from(!is_empty) + encoded.len() + 1;

        if !is_empty && projected > max_bytes {
            current.push(']');
            chunks.push(std::mem::replace(&mut current, String::from("[")));
        }

        if current.len() > 1 {
            current.push(',');
        }
        current.push_str(&encoded);
    }

    if current.len() > 1 {
        current.push(']');
        chunks.push(current);
    }

    if let Some(largest) = chunks.iter().map(String::len).filter(|&len| len > max_bytes).max() {
        warn!(largest, max_bytes, "Cache item larger than the chunk limit");
    }

    Ok(chunks)
}

/// Decode chunks produced by [`split`] back into one list, in order
pub fn combine<T: DeserializeOwned>(chunks: &[String]) -> CacheResult<Vec<T>> {
    let mut items = Vec::new();
    for chunk in chunks {
        let mut part: Vec<T> = serde_json::from_str(chunk)?;
        items.append(&mut part);
    }
    Ok(items)
}
