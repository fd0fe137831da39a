//! Test fixtures and data generators
//!
//! In-memory implementations of the store and fetcher ports, plus a harness
//! that wires them into a `ServiceContext` with both cache tiers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use history_cache::{CacheChain, DistributedCache, InProcessCache, KvStore, MemoryKv};
use history_common::{BackfillConfig, ContextConfig, SyncConfig};
use history_core::{
    ChannelCount, ChannelInfo, ChannelStatus, ChannelStatusRepository, DomainError, FetchError,
    FetchResult, HistoryFetcher, HistoryQuery, MessageRepository, RawMessage, RepoResult,
    Snowflake, StoredMessage,
};
use history_service::{ServiceContext, ServiceContextBuilder, ServiceSettings};
use parking_lot::Mutex;

// ============================================================================
// Message generators
// ============================================================================

/// Fixed origin for synthetic message timestamps
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default()
}

/// Id of the `seq`-th message of a synthetic channel.
///
/// Messages are one second apart; the channel id goes into the low bits so
/// ids never collide across channels.
pub fn message_id(channel_id: Snowflake, seq: i64) -> Snowflake {
    let at = base_time() + chrono::Duration::seconds(seq);
    Snowflake::new(Snowflake::from_datetime(at).into_inner() | (channel_id.into_inner() & 0x3F_FFFF))
}

/// A text message from the platform
pub fn raw_message(channel_id: Snowflake, seq: i64, content: &str) -> RawMessage {
    let id = message_id(channel_id, seq);
    RawMessage {
        id,
        channel_id,
        author_id: Snowflake::new(1000 + seq % 3),
        author_name: format!("user{}", seq % 3),
        content: content.to_string(),
        clean_content: content.to_string(),
        has_attachments: false,
        has_embeds: false,
        created_at: id.created_at(),
    }
}

/// Messages `1..=count` of a synthetic channel, oldest first
pub fn synthetic_channel(channel_id: Snowflake, count: i64) -> Vec<RawMessage> {
    (1..=count)
        .map(|seq| raw_message(channel_id, seq, &format!("message {seq}")))
        .collect()
}

/// Store rows for a slice of platform messages
pub fn stored(messages: &[RawMessage]) -> Vec<StoredMessage> {
    messages
        .iter()
        .filter_map(|m| StoredMessage::from_raw(m, chrono_tz::UTC))
        .collect()
}

// ============================================================================
// In-memory durable store
// ============================================================================

/// `MessageRepository` and `ChannelStatusRepository` over ordered maps
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<BTreeMap<Snowflake, StoredMessage>>,
    status: Mutex<HashMap<Snowflake, ChannelStatus>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored id of a channel, oldest first
    pub fn ids(&self, channel_id: Snowflake) -> Vec<Snowflake> {
        self.messages
            .lock()
            .values()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.message_id)
            .collect()
    }

    fn channel_rows(&self, channel_id: Snowflake) -> Vec<StoredMessage> {
        self.messages
            .lock()
            .values()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect()
    }

    fn count_of(&self, channel_id: Snowflake) -> i64 {
        let count = self
            .messages
            .lock()
            .values()
            .filter(|m| m.channel_id == channel_id)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}

fn newest(rows: Vec<StoredMessage>, limit: usize) -> Vec<StoredMessage> {
    let skip = rows.len().saturating_sub(limit);
    rows.into_iter().skip(skip).collect()
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn upsert(&self, message: &StoredMessage) -> RepoResult<()> {
        let mut messages = self.messages.lock();
        match messages.get_mut(&message.message_id) {
            Some(existing) => {
                existing.content.clone_from(&message.content);
                existing.timestamp_str.clone_from(&message.timestamp_str);
            }
            None => {
                messages.insert(message.message_id, message.clone());
            }
        }
        Ok(())
    }

    async fn upsert_many(&self, messages: &[StoredMessage]) -> RepoResult<u64> {
        for message in messages {
            self.upsert(message).await?;
        }
        Ok(messages.len() as u64)
    }

    async fn delete(&self, message_id: Snowflake) -> RepoResult<bool> {
        Ok(self.messages.lock().remove(&message_id).is_some())
    }

    async fn delete_many(
        &self,
        channel_id: Snowflake,
        message_ids: &[Snowflake],
    ) -> RepoResult<u64> {
        let mut messages = self.messages.lock();
        let mut removed = 0;
        for id in message_ids {
            if messages.get(id).is_some_and(|m| m.channel_id == channel_id) {
                messages.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn find_by_id(&self, message_id: Snowflake) -> RepoResult<Option<StoredMessage>> {
        Ok(self.messages.lock().get(&message_id).cloned())
    }

    async fn get_recent(
        &self,
        channel_id: Snowflake,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>> {
        Ok(newest(self.channel_rows(channel_id), limit))
    }

    async fn get_before(
        &self,
        channel_id: Snowflake,
        before: Snowflake,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>> {
        let rows = self
            .channel_rows(channel_id)
            .into_iter()
            .filter(|m| m.message_id < before)
            .collect();
        Ok(newest(rows, limit))
    }

    async fn recent_ids(&self, channel_id: Snowflake, limit: usize) -> RepoResult<Vec<Snowflake>> {
        let mut ids = self.ids(channel_id);
        ids.reverse();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn count(&self, channel_id: Snowflake) -> RepoResult<i64> {
        Ok(self.count_of(channel_id))
    }

    async fn latest_id(&self, channel_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self.ids(channel_id).last().copied())
    }

    async fn oldest_id(&self, channel_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self.ids(channel_id).first().copied())
    }
}

#[async_trait]
impl ChannelStatusRepository for InMemoryMessageStore {
    async fn find(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelStatus>> {
        Ok(self.status.lock().get(&channel_id).cloned())
    }

    async fn is_backfilled(&self, channel_id: Snowflake) -> RepoResult<bool> {
        Ok(self
            .status
            .lock()
            .get(&channel_id)
            .is_some_and(|s| s.is_fully_backfilled))
    }

    async fn mark_backfilled(&self, channel_id: Snowflake, complete: bool) -> RepoResult<()> {
        self.status.lock().insert(
            channel_id,
            ChannelStatus {
                channel_id,
                is_fully_backfilled: complete,
                last_updated: Utc::now(),
            },
        );
        Ok(())
    }

    async fn reset_backfilled_below(&self, threshold: i64) -> RepoResult<Vec<Snowflake>> {
        let candidates: Vec<Snowflake> = self
            .status
            .lock()
            .values()
            .filter(|s| s.is_fully_backfilled)
            .map(|s| s.channel_id)
            .collect();

        let mut reset = Vec::new();
        for channel_id in candidates {
            if self.count_of(channel_id) < threshold {
                self.mark_backfilled(channel_id, false).await?;
                reset.push(channel_id);
            }
        }
        reset.sort();
        Ok(reset)
    }

    async fn channel_counts(&self, limit: usize) -> RepoResult<Vec<ChannelCount>> {
        let mut channels: HashSet<Snowflake> =
            self.messages.lock().values().map(|m| m.channel_id).collect();
        channels.extend(self.status.lock().keys().copied());

        let mut counts = Vec::with_capacity(channels.len());
        for channel_id in channels {
            counts.push(ChannelCount {
                channel_id,
                message_count: self.count_of(channel_id),
                is_fully_backfilled: self.is_backfilled(channel_id).await?,
            });
        }
        counts.sort_by(|a, b| {
            b.message_count
                .cmp(&a.message_count)
                .then(a.channel_id.cmp(&b.channel_id))
        });
        counts.truncate(limit);
        Ok(counts)
    }
}

/// Message store whose every call fails, for degraded-path tests
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable<T>() -> RepoResult<T> {
    Err(DomainError::DatabaseError("store unavailable".to_string()))
}

#[async_trait]
impl MessageRepository for FailingStore {
    async fn upsert(&self, _: &StoredMessage) -> RepoResult<()> {
        unavailable()
    }
    async fn upsert_many(&self, _: &[StoredMessage]) -> RepoResult<u64> {
        unavailable()
    }
    async fn delete(&self, _: Snowflake) -> RepoResult<bool> {
        unavailable()
    }
    async fn delete_many(&self, _: Snowflake, _: &[Snowflake]) -> RepoResult<u64> {
        unavailable()
    }
    async fn find_by_id(&self, _: Snowflake) -> RepoResult<Option<StoredMessage>> {
        unavailable()
    }
    async fn get_recent(&self, _: Snowflake, _: usize) -> RepoResult<Vec<StoredMessage>> {
        unavailable()
    }
    async fn get_before(&self, _: Snowflake, _: Snowflake, _: usize) -> RepoResult<Vec<StoredMessage>> {
        unavailable()
    }
    async fn recent_ids(&self, _: Snowflake, _: usize) -> RepoResult<Vec<Snowflake>> {
        unavailable()
    }
    async fn count(&self, _: Snowflake) -> RepoResult<i64> {
        unavailable()
    }
    async fn latest_id(&self, _: Snowflake) -> RepoResult<Option<Snowflake>> {
        unavailable()
    }
    async fn oldest_id(&self, _: Snowflake) -> RepoResult<Option<Snowflake>> {
        unavailable()
    }
}

// ============================================================================
// Scripted platform
// ============================================================================

/// How a scripted channel fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Forbidden,
    Transport,
}

/// A finite fake platform that records every fetch it serves
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    /// Channel contents, keyed by message id
    channels: Mutex<HashMap<Snowflake, BTreeMap<Snowflake, RawMessage>>>,
    failures: Mutex<HashMap<Snowflake, Failure>>,
    calls: Mutex<Vec<(Snowflake, HistoryQuery)>>,
    delay: Mutex<Duration>,
    /// Extra latency per 100 requested messages
    page_cost: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `messages` for their channel
    #[must_use]
    pub fn with_messages(self, messages: Vec<RawMessage>) -> Self {
        for message in messages {
            self.push(message);
        }
        self
    }

    /// Hold every fetch open for `delay`
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    /// Make each fetch take `cost` for every 100 messages it asks for,
    /// like a paginating REST client
    #[must_use]
    pub fn with_page_cost(self, cost: Duration) -> Self {
        *self.page_cost.lock() = cost;
        self
    }

    /// Make every fetch for `channel_id` fail
    #[must_use]
    pub fn failing(self, channel_id: Snowflake, failure: Failure) -> Self {
        self.failures.lock().insert(channel_id, failure);
        self
    }

    /// Add or overwrite a message on the platform
    pub fn push(&self, message: RawMessage) {
        self.channels
            .lock()
            .entry(message.channel_id)
            .or_default()
            .insert(message.id, message);
    }

    /// Delete a message on the platform
    pub fn remove(&self, channel_id: Snowflake, message_id: Snowflake) {
        if let Some(channel) = self.channels.lock().get_mut(&channel_id) {
            channel.remove(&message_id);
        }
    }

    /// Make a channel fail from now on
    pub fn fail(&self, channel_id: Snowflake, failure: Failure) {
        self.failures.lock().insert(channel_id, failure);
    }

    /// Every fetch served so far, in call order
    pub fn calls(&self) -> Vec<(Snowflake, HistoryQuery)> {
        self.calls.lock().clone()
    }

    /// Fetches served for one channel
    pub fn calls_for(&self, channel_id: Snowflake) -> Vec<HistoryQuery> {
        self.calls()
            .into_iter()
            .filter(|(channel, _)| *channel == channel_id)
            .map(|(_, query)| query)
            .collect()
    }

    /// Highest number of fetches that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn page(&self, channel_id: Snowflake, query: HistoryQuery) -> Vec<RawMessage> {
        let channels = self.channels.lock();
        let Some(channel) = channels.get(&channel_id) else {
            return Vec::new();
        };

        if let Some(after) = query.after {
            return channel
                .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
                .map(|(_, m)| m.clone())
                .take(query.limit)
                .collect();
        }

        let upper = query
            .before
            .map_or(std::ops::Bound::Unbounded, std::ops::Bound::Excluded);
        channel
            .range((std::ops::Bound::Unbounded, upper))
            .rev()
            .map(|(_, m)| m.clone())
            .take(query.limit)
            .collect()
    }
}

#[async_trait]
impl HistoryFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        channel_id: Snowflake,
        query: HistoryQuery,
    ) -> FetchResult<Vec<RawMessage>> {
        self.calls.lock().push((channel_id, query));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let pages = u32::try_from(query.limit.div_ceil(100)).unwrap_or(u32::MAX);
        let delay = *self.delay.lock() + *self.page_cost.lock() * pages;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().get(&channel_id).copied();
        match failure {
            Some(Failure::Forbidden) => Err(FetchError::Forbidden(channel_id)),
            Some(Failure::Transport) => Err(FetchError::Transport("connection reset".to_string())),
            None => Ok(self.page(channel_id, query)),
        }
    }

    async fn channel_info(&self, channel_id: Snowflake) -> FetchResult<ChannelInfo> {
        if self.failures.lock().contains_key(&channel_id) {
            return Err(FetchError::Transport("connection reset".to_string()));
        }
        Ok(ChannelInfo {
            id: channel_id,
            name: "general".to_string(),
            guild_name: Some("Test Guild".to_string()),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Settings with delays removed and UTC labels
pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        backfill: BackfillConfig {
            iteration_delay_ms: 0,
            channel_delay_ms: 0,
            fetch_timeout_secs: 5,
            ..BackfillConfig::default()
        },
        sync: SyncConfig::default(),
        context: ContextConfig {
            timezone: chrono_tz::UTC,
            ..ContextConfig::default()
        },
    }
}

/// A service context over in-memory collaborators
pub struct Harness {
    pub ctx: ServiceContext,
    pub store: Arc<InMemoryMessageStore>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub kv: Arc<MemoryKv>,
}

impl Harness {
    pub fn new(fetcher: ScriptedFetcher) -> Self {
        Self::with_settings(fetcher, test_settings())
    }

    pub fn with_settings(fetcher: ScriptedFetcher, settings: ServiceSettings) -> Self {
        let store = Arc::new(InMemoryMessageStore::new());
        let fetcher = Arc::new(fetcher);
        let kv = Arc::new(MemoryKv::new());

        let ttl = Duration::from_secs(120);
        let distributed = DistributedCache::new(kv.clone() as Arc<dyn KvStore>, ttl, 2000, 10 * 1024 * 1024);
        let cache = CacheChain::new(InProcessCache::new(ttl, 2000), Some(distributed));

        let ctx = ServiceContextBuilder::new()
            .message_repo(store.clone())
            .status_repo(store.clone())
            .fetcher(fetcher.clone())
            .cache(Arc::new(cache))
            .settings(settings)
            .build()
            .expect("harness context");

        Self {
            ctx,
            store,
            fetcher,
            kv,
        }
    }

    /// Pre-load store rows without touching the platform
    pub async fn seed(&self, messages: &[RawMessage]) {
        self.store
            .upsert_many(&stored(messages))
            .await
            .expect("seed store");
    }
}
