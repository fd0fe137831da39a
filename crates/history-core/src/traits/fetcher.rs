//! Platform history fetcher port

use async_trait::async_trait;

use crate::entities::{ChannelInfo, RawMessage};
use crate::error::FetchError;
use crate::value_objects::Snowflake;

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Cursor-based page request against the platform history API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: usize,
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
}

impl HistoryQuery {
    /// The newest `limit` messages
    pub fn latest(limit: usize) -> Self {
        Self {
            limit,
            before: None,
            after: None,
        }
    }

    /// Up to `limit` messages strictly older than `id`
    pub fn before(id: Snowflake, limit: usize) -> Self {
        Self {
            limit,
            before: Some(id),
            after: None,
        }
    }

    /// Up to `limit` messages strictly newer than `id`
    pub fn after(id: Snowflake, limit: usize) -> Self {
        Self {
            limit,
            before: None,
            after: Some(id),
        }
    }
}

/// Adapter over the platform's paginated history API.
///
/// Ordering of the returned page:
/// - `after` queries: oldest to newest
/// - `before` and unbounded queries: newest to oldest
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Fetch one logical page, following platform pagination up to `query.limit`
    async fn fetch(&self, channel_id: Snowflake, query: HistoryQuery)
        -> FetchResult<Vec<RawMessage>>;

    /// Name and guild of a channel
    async fn channel_info(&self, channel_id: Snowflake) -> FetchResult<ChannelInfo>;
}
