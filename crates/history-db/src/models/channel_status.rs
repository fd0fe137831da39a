//! Channel status database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for channel_status table
#[derive(Debug, Clone, FromRow)]
pub struct ChannelStatusModel {
    pub channel_id: i64,
    pub is_fully_backfilled: bool,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate row: stored message count joined with the backfill flag
#[derive(Debug, Clone, FromRow)]
pub struct ChannelCountModel {
    pub channel_id: i64,
    pub message_count: i64,
    pub is_fully_backfilled: bool,
}
