//! Message entities - the platform's view and the stored row

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::formatting::absolute_timestamp;
use crate::value_objects::Snowflake;

/// Stored in place of empty content when the message carries attachments
pub const ATTACHMENT_PLACEHOLDER: &str = "[attachment]";

/// Stored in place of empty content when the message carries only embeds
pub const EMBED_PLACEHOLDER: &str = "[embed]";

/// A message as returned by the platform history API or delivered as a live event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    /// Display name at the time of fetching
    pub author_name: String,
    /// Content exactly as sent (mentions as `<@id>` markup)
    pub content: String,
    /// Content with mentions resolved to readable names
    pub clean_content: String,
    pub has_attachments: bool,
    pub has_embeds: bool,
    pub created_at: DateTime<Utc>,
}

impl RawMessage {
    /// Text worth storing for this message, or `None` if it carries nothing.
    ///
    /// Image-only and embed-only messages keep a placeholder so the transcript
    /// still shows that the author said something.
    pub fn storable_content(&self) -> Option<String> {
        let text = if self.clean_content.trim().is_empty() {
            self.content.trim()
        } else {
            self.clean_content.trim()
        };

        if !text.is_empty() {
            Some(text.to_string())
        } else if self.has_attachments {
            Some(ATTACHMENT_PLACEHOLDER.to_string())
        } else if self.has_embeds {
            Some(EMBED_PLACEHOLDER.to_string())
        } else {
            None
        }
    }
}

/// One durable row per platform message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    /// Display snapshot, may be stale after a rename
    pub author_name: String,
    /// Never empty
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub timestamp_str: String,
}

impl StoredMessage {
    /// Build the row for a platform message, skipping messages with no content at all
    pub fn from_raw(raw: &RawMessage, tz: Tz) -> Option<Self> {
        let content = raw.storable_content()?;
        Some(Self {
            message_id: raw.id,
            channel_id: raw.channel_id,
            author_id: raw.author_id,
            author_name: raw.author_name.clone(),
            content,
            created_at: raw.created_at,
            timestamp_str: absolute_timestamp(raw.created_at, tz),
        })
    }
}
