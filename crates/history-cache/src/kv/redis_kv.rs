//! `KvStore` backed by the Redis pool

use std::time::Duration;

use async_trait::async_trait;

use super::KvStore;
use crate::error::CacheResult;
use crate::pool::RedisPool;

#[async_trait]
impl KvStore for RedisPool {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.get_string(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        Ok(self.set_string(key, value, ttl.as_secs()).await?)
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        Ok(self.delete_many(keys).await?)
    }
}
