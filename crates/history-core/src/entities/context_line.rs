//! Cached transcript entry

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::StoredMessage;
use crate::formatting::relative_label;
use crate::value_objects::Snowflake;

/// One message as held by the cache tiers.
///
/// The id is kept so edits and deletes can target a single entry; the
/// timestamp label is rendered at read time so it never goes stale in cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub message_id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ContextLine {
    /// `<label> <author>(<author_id>): <content>`
    pub fn render(&self, now: DateTime<Utc>, tz: Tz) -> String {
        format!(
            "{} {}({}): {}",
            relative_label(self.created_at, now, tz),
            self.author_name,
            self.author_id,
            self.content
        )
    }
}

impl From<&StoredMessage> for ContextLine {
    fn from(message: &StoredMessage) -> Self {
        Self {
            message_id: message.message_id,
            author_id: message.author_id,
            author_name: message.author_name.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<StoredMessage> for ContextLine {
    fn from(message: StoredMessage) -> Self {
        Self {
            message_id: message.message_id,
            author_id: message.author_id,
            author_name: message.author_name,
            content: message.content,
            created_at: message.created_at,
        }
    }
}
