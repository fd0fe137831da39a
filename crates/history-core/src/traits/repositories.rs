//! Repository traits (ports) - define the interface for data access
//!
//! The durable store is the source of truth for channel history. Missing rows
//! are never errors: lookups return `None`, empty vectors or zero counts.

use async_trait::async_trait;

use crate::entities::{ChannelCount, ChannelStatus, StoredMessage};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a message, or update its content and label if the id exists.
    ///
    /// Never changes `channel_id` or `created_at` of an existing row.
    async fn upsert(&self, message: &StoredMessage) -> RepoResult<()>;

    /// Upsert a batch in one round trip, returning the number of rows written
    async fn upsert_many(&self, messages: &[StoredMessage]) -> RepoResult<u64>;

    /// Remove a message; returns whether a row existed
    async fn delete(&self, message_id: Snowflake) -> RepoResult<bool>;

    /// Remove several messages of one channel
    async fn delete_many(&self, channel_id: Snowflake, message_ids: &[Snowflake])
        -> RepoResult<u64>;

    /// Find a message by id
    async fn find_by_id(&self, message_id: Snowflake) -> RepoResult<Option<StoredMessage>>;

    /// Up to `limit` most recent messages, oldest first
    async fn get_recent(&self, channel_id: Snowflake, limit: usize)
        -> RepoResult<Vec<StoredMessage>>;

    /// Up to `limit` most recent messages strictly older than `before`, oldest first
    async fn get_before(
        &self,
        channel_id: Snowflake,
        before: Snowflake,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>>;

    /// Ids of the `limit` most recent messages, newest first
    async fn recent_ids(&self, channel_id: Snowflake, limit: usize) -> RepoResult<Vec<Snowflake>>;

    /// Number of stored messages in a channel
    async fn count(&self, channel_id: Snowflake) -> RepoResult<i64>;

    /// Newest stored message id
    async fn latest_id(&self, channel_id: Snowflake) -> RepoResult<Option<Snowflake>>;

    /// Oldest stored message id
    async fn oldest_id(&self, channel_id: Snowflake) -> RepoResult<Option<Snowflake>>;
}

// ============================================================================
// Channel Status Repository
// ============================================================================

#[async_trait]
pub trait ChannelStatusRepository: Send + Sync {
    /// Status row for a channel, if one was ever written
    async fn find(&self, channel_id: Snowflake) -> RepoResult<Option<ChannelStatus>>;

    /// Whether a backward scan has reached the start of the channel
    async fn is_backfilled(&self, channel_id: Snowflake) -> RepoResult<bool>;

    /// Set the backfill flag (creates the row if missing)
    async fn mark_backfilled(&self, channel_id: Snowflake, complete: bool) -> RepoResult<()>;

    /// Reset the flag on every complete channel holding fewer than `threshold`
    /// messages, returning the channels that were reset
    async fn reset_backfilled_below(&self, threshold: i64) -> RepoResult<Vec<Snowflake>>;

    /// Message counts per channel, largest first
    async fn channel_counts(&self, limit: usize) -> RepoResult<Vec<ChannelCount>>;
}
