//! Distributed tier: channel windows in a shared key/value store

use std::sync::Arc;
use std::time::Duration;

use history_core::{ContextLine, Snowflake};

use super::window::{remove_lines, replace_line, trim, upsert_line};
use crate::chunked::ChunkedStore;
use crate::error::CacheResult;
use crate::keys::context_key;
use crate::kv::KvStore;

/// Channel windows stored under `context:<channel_id>`, chunked when large.
///
/// Fine-grained edits are read-modify-write; concurrent writers on the same
/// channel from different processes can lose an update until the next refill.
#[derive(Debug, Clone)]
pub struct DistributedCache {
    store: ChunkedStore,
    max_lines: usize,
}

impl DistributedCache {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration, max_lines: usize, max_value_bytes: usize) -> Self {
        Self {
            store: ChunkedStore::new(kv, max_value_bytes, ttl),
            max_lines,
        }
    }

    pub async fn get(&self, channel_id: Snowflake) -> CacheResult<Option<Vec<ContextLine>>> {
        self.store.get(&context_key(channel_id)).await
    }

    pub async fn set(&self, channel_id: Snowflake, lines: &[ContextLine]) -> CacheResult<()> {
        let start = lines.len().saturating_sub(self.max_lines);
        self.store.set(&context_key(channel_id), &lines[start..]).await
    }

    pub async fn delete(&self, channel_id: Snowflake) -> CacheResult<()> {
        self.store.delete(&context_key(channel_id)).await
    }

    pub async fn append_one(&self, channel_id: Snowflake, line: ContextLine) -> CacheResult<()> {
        let mut lines = self.get(channel_id).await?.unwrap_or_default();
        upsert_line(&mut lines, line, self.max_lines);
        self.set(channel_id, &lines).await
    }

    pub async fn replace_one(&self, channel_id: Snowflake, line: ContextLine) -> CacheResult<()> {
        let Some(mut lines) = self.get(channel_id).await? else {
            return Ok(());
        };
        if replace_line(&mut lines, line) {
            self.set(channel_id, &lines).await?;
        }
        Ok(())
    }

    pub async fn remove_many(&self, channel_id: Snowflake, message_ids: &[Snowflake]) -> CacheResult<()> {
        let Some(mut lines) = self.get(channel_id).await? else {
            return Ok(());
        };
        if remove_lines(&mut lines, message_ids) > 0 {
            trim(&mut lines, self.max_lines);
            self.set(channel_id, &lines).await?;
        }
        Ok(())
    }
}
