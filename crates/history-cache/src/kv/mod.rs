//! Key/value port used by the distributed cache tier

mod memory;
mod redis_kv;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

pub use memory::MemoryKv;

/// Minimal string key/value store with per-key TTL
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value; expired and missing keys are `None`
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write a value, replacing any previous one and resetting its TTL
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> CacheResult<u64>;
}
