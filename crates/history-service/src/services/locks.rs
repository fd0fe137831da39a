//! Per-channel mutual exclusion for ingestion work

use std::sync::Arc;

use dashmap::DashMap;
use history_core::Snowflake;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created async mutex per channel.
///
/// Entries are never evicted; the number of channels is bounded by the
/// platform channels the bot can see. The map shard lock is held only while
/// looking up or inserting the mutex, never across the guarded section.
#[derive(Debug, Clone, Default)]
pub struct ChannelLocks {
    inner: Arc<DashMap<Snowflake, Arc<Mutex<()>>>>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, channel_id: Snowflake) -> Arc<Mutex<()>> {
        self.inner
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to a channel
    pub async fn acquire(&self, channel_id: Snowflake) -> OwnedMutexGuard<()> {
        self.lock_for(channel_id).lock_owned().await
    }

    /// Whether some task currently holds the channel lock
    pub fn is_locked(&self, channel_id: Snowflake) -> bool {
        self.inner
            .get(&channel_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of channels that have ever been locked
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
