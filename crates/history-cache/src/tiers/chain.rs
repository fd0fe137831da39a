//! Cache chain: in-process tier first, then the distributed tier

use std::fmt;

use history_core::{ContextLine, Snowflake};

use super::distributed::DistributedCache;
use super::memory::InProcessCache;
use crate::error::CacheResult;

/// Which source served a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTier {
    /// In-process window, younger than the TTL
    Memory,
    /// Shared key/value cache
    Distributed,
    /// Durable store
    Store,
    /// Platform history API
    Live,
    /// Expired in-process window, served because fresher sources failed
    Stale,
}

impl fmt::Display for LookupTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Distributed => "distributed",
            Self::Store => "store",
            Self::Live => "live",
            Self::Stale => "stale",
        };
        f.write_str(name)
    }
}

/// A window of lines together with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub lines: Vec<ContextLine>,
    pub tier: LookupTier,
}

impl Lookup {
    pub fn new(lines: Vec<ContextLine>, tier: LookupTier) -> Self {
        Self { lines, tier }
    }
}

/// In-process cache backed by an optional distributed cache.
///
/// Writes always reach the in-process tier. The returned `Result` reports
/// only distributed-tier failures so callers can decide to ignore them.
#[derive(Debug)]
pub struct CacheChain {
    memory: InProcessCache,
    distributed: Option<DistributedCache>,
}

impl CacheChain {
    pub fn new(memory: InProcessCache, distributed: Option<DistributedCache>) -> Self {
        Self {
            memory,
            distributed,
        }
    }

    /// Chain with no distributed tier
    pub fn memory_only(memory: InProcessCache) -> Self {
        Self::new(memory, None)
    }

    pub fn has_distributed(&self) -> bool {
        self.distributed.is_some()
    }

    pub fn max_lines(&self) -> usize {
        self.memory.max_lines()
    }

    /// Fresh window from the fastest tier that has one.
    ///
    /// A distributed hit is copied into the in-process tier. Distributed
    /// failures, including corrupt entries, are logged and read as a miss.
    pub async fn lookup(&self, channel_id: Snowflake) -> Option<Lookup> {
        if let Some(lines) = self.memory.get(channel_id) {
            return Some(Lookup::new(lines, LookupTier::Memory));
        }

        let distributed = self.distributed.as_ref()?;
        match distributed.get(channel_id).await {
            Ok(Some(lines)) => {
                self.memory.set(channel_id, lines.clone());
                Some(Lookup::new(lines, LookupTier::Distributed))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(channel_id = %channel_id, error = %e, "Distributed cache read failed");
                None
            }
        }
    }

    /// Expired in-process window, if any
    pub fn stale(&self, channel_id: Snowflake) -> Option<Lookup> {
        self.memory
            .get_stale(channel_id)
            .map(|lines| Lookup::new(lines, LookupTier::Stale))
    }

    pub async fn set(&self, channel_id: Snowflake, lines: &[ContextLine]) -> CacheResult<()> {
        self.memory.set(channel_id, lines.to_vec());
        match &self.distributed {
            Some(distributed) => distributed.set(channel_id, lines).await,
            None => Ok(()),
        }
    }

    pub async fn append_one(&self, channel_id: Snowflake, line: ContextLine) -> CacheResult<()> {
        self.memory.append_one(channel_id, line.clone());
        match &self.distributed {
            Some(distributed) => distributed.append_one(channel_id, line).await,
            None => Ok(()),
        }
    }

    pub async fn replace_one(&self, channel_id: Snowflake, line: ContextLine) -> CacheResult<()> {
        self.memory.replace_one(channel_id, line.clone());
        match &self.distributed {
            Some(distributed) => distributed.replace_one(channel_id, line).await,
            None => Ok(()),
        }
    }

    pub async fn remove_one(&self, channel_id: Snowflake, message_id: Snowflake) -> CacheResult<()> {
        self.remove_many(channel_id, &[message_id]).await
    }

    pub async fn remove_many(&self, channel_id: Snowflake, message_ids: &[Snowflake]) -> CacheResult<()> {
        self.memory.remove_many(channel_id, message_ids);
        match &self.distributed {
            Some(distributed) => distributed.remove_many(channel_id, message_ids).await,
            None => Ok(()),
        }
    }

    pub async fn delete(&self, channel_id: Snowflake) -> CacheResult<()> {
        self.memory.delete(channel_id);
        match &self.distributed {
            Some(distributed) => distributed.delete(channel_id).await,
            None => Ok(()),
        }
    }
}
