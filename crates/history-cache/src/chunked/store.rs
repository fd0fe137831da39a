//! Chunk-aware reads and writes over a `KvStore`

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::codec::{combine, split};
use crate::error::{CacheError, CacheResult};
use crate::keys::{chunk_key, meta_key};
use crate::kv::KvStore;

/// Metadata record written next to a chunked value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub chunks: usize,
    pub total_messages: usize,
}

/// Stores lists under a base key, spilling into `base:chunk:i` keys plus a
/// `base:meta` record when the serialized list exceeds `max_bytes`.
#[derive(Clone)]
pub struct ChunkedStore {
    kv: Arc<dyn KvStore>,
    max_bytes: usize,
    ttl: Duration,
}

impl std::fmt::Debug for ChunkedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedStore")
            .field("max_bytes", &self.max_bytes)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ChunkedStore {
    pub fn new(kv: Arc<dyn KvStore>, max_bytes: usize, ttl: Duration) -> Self {
        Self { kv, max_bytes, ttl }
    }

    /// Write `items` under `base`, replacing whatever was there before.
    ///
    /// An empty list deletes the entry.
    pub async fn set<T: Serialize + Sync>(&self, base: &str, items: &[T]) -> CacheResult<()> {
        if items.is_empty() {
            return self.delete(base).await;
        }

        let whole = serde_json::to_string(items)?;
        if whole.len() <= self.max_bytes {
            self.clear_chunks(base).await?;
            self.kv.set(base, &whole, self.ttl).await?;
            return Ok(());
        }

        let chunks = split(items, self.max_bytes)?;
        // Old base value and old chunks must not outlive this write
        self.delete(base).await?;
        for (index, chunk) in chunks.iter().enumerate() {
            self.kv.set(&chunk_key(base, index), chunk, self.ttl).await?;
        }
        let meta = ChunkMeta {
            chunks: chunks.len(),
            total_messages: items.len(),
        };
        self.kv
            .set(&meta_key(base), &serde_json::to_string(&meta)?, self.ttl)
            .await?;

        tracing::debug!(
            key = %base,
            chunks = meta.chunks,
            total = meta.total_messages,
            "Stored chunked cache entry"
        );
        Ok(())
    }

    /// Read the list under `base`.
    ///
    /// Returns `Ok(None)` when the entry is absent or any chunk is missing, and
    /// `Err(CacheError::Corrupt)` when a stored value cannot be decoded.
    pub async fn get<T: DeserializeOwned>(&self, base: &str) -> CacheResult<Option<Vec<T>>> {
        if let Some(whole) = self.kv.get(base).await? {
            let items = serde_json::from_str(&whole).map_err(|e| corrupt(base, &e))?;
            return Ok(Some(items));
        }

        let Some(meta) = self.read_meta(base).await? else {
            return Ok(None);
        };

        let mut chunks = Vec::with_capacity(meta.chunks);
        for index in 0..meta.chunks {
            let key = chunk_key(base, index);
            match self.kv.get(&key).await? {
                Some(chunk) => chunks.push(chunk),
                None => {
                    tracing::warn!(key = %key, "Missing cache chunk, treating entry as absent");
                    return Ok(None);
                }
            }
        }

        let items: Vec<T> = combine(&chunks).map_err(|e| corrupt(base, &e))?;
        if items.len() != meta.total_messages {
            return Err(CacheError::Corrupt {
                key: base.to_string(),
                reason: format!(
                    "expected {} items, decoded {}",
                    meta.total_messages,
                    items.len()
                ),
            });
        }
        Ok(Some(items))
    }

    /// Remove the base value, all chunks and the metadata record
    pub async fn delete(&self, base: &str) -> CacheResult<()> {
        self.clear_chunks(base).await?;
        self.kv.delete(&[base.to_string()]).await?;
        Ok(())
    }

    /// Remove chunk keys and metadata, leaving the base key alone
    async fn clear_chunks(&self, base: &str) -> CacheResult<()> {
        // Unreadable metadata still gets its own key removed
        let count = self.read_meta(base).await.ok().flatten().map_or(0, |m| m.chunks);
        let mut keys: Vec<String> = (0..count).map(|i| chunk_key(base, i)).collect();
        keys.push(meta_key(base));
        self.kv.delete(&keys).await?;
        Ok(())
    }

    async fn read_meta(&self, base: &str) -> CacheResult<Option<ChunkMeta>> {
        let key = meta_key(base);
        match self.kv.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| corrupt(&key, &e))?)),
            None => Ok(None),
        }
    }
}

fn corrupt(key: &str, err: &dyn std::fmt::Display) -> CacheError {
    CacheError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    }
}
