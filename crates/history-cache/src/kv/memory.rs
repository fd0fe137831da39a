//! In-memory `KvStore` with TTL, for single-process deployments and tests

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::KvStore;
use crate::error::CacheResult;

/// HashMap-backed key/value store
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unexpired) keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, (_, expires))| *expires > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Overwrite a raw value, bypassing serialization (used to simulate corruption)
    pub fn insert_raw(&self, key: &str, value: &str, ttl: Duration) {
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.insert_raw(key, value, ttl);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.lock();
        Ok(keys.iter().filter(|key| entries.remove(*key).is_some()).count() as u64)
    }
}
