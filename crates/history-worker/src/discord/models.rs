//! Wire shapes of the platform REST API

use chrono::{DateTime, Utc};
use history_core::{RawMessage, Snowflake};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl ApiUser {
    /// Global display name, falling back to the username
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author: ApiUser,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    #[serde(default)]
    pub embeds: Vec<serde_json::Value>,
    #[serde(default)]
    pub mentions: Vec<ApiUser>,
}

impl From<ApiMessage> for RawMessage {
    fn from(message: ApiMessage) -> Self {
        let clean = clean_content(&message.content, &message.mentions);
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author.id,
            author_name: message.author.display_name().to_string(),
            content: message.content,
            clean_content: clean,
            has_attachments: !message.attachments.is_empty(),
            has_embeds: !message.embeds.is_empty(),
            created_at: message.timestamp,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannel {
    pub id: Snowflake,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGuild {
    pub name: String,
}

/// Body of a 429 response
#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitBody {
    /// Seconds
    pub retry_after: f64,
}

/// Replace `<@id>` and `<@!id>` user mentions with `@display_name`
pub fn clean_content(content: &str, mentions: &[ApiUser]) -> String {
    let mut clean = content.to_string();
    for user in mentions {
        let replacement = format!("@{}", user.display_name());
        clean = clean
            .replace(&format!("<@{}>", user.id), &replacement)
            .replace(&format!("<@!{}>", user.id), &replacement);
    }
    clean
}
