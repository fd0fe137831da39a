//! Channel-level records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Backfill-completion metadata, one row per channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub channel_id: Snowflake,
    /// Set once a backward scan reached the start of the channel's history
    pub is_fully_backfilled: bool,
    pub last_updated: DateTime<Utc>,
}

/// Descriptive channel metadata used in the transcript header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: Snowflake,
    pub name: String,
    /// `None` for direct messages
    pub guild_name: Option<String>,
}

impl ChannelInfo {
    /// Fallback used when the platform cannot describe the channel
    pub fn unknown(id: Snowflake) -> Self {
        Self {
            id,
            name: "unknown".to_string(),
            guild_name: None,
        }
    }

    /// Guild name, or "Direct Message" when the channel has no guild
    pub fn guild_label(&self) -> &str {
        self.guild_name.as_deref().unwrap_or("Direct Message")
    }
}

/// Stored message count for a channel, used by maintenance tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCount {
    pub channel_id: Snowflake,
    pub message_count: i64,
    pub is_fully_backfilled: bool,
}
