//! StoredMessage entity <-> model mapper

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use history_core::entities::StoredMessage;
use history_core::value_objects::Snowflake;

use crate::models::MessageModel;

/// Convert MessageModel to StoredMessage entity
impl From<MessageModel> for StoredMessage {
    fn from(model: MessageModel) -> Self {
        StoredMessage {
            message_id: Snowflake::new(model.message_id),
            channel_id: Snowflake::new(model.channel_id),
            author_id: Snowflake::new(model.author_id),
            author_name: model.author_name,
            content: model.content,
            created_at: model.created_at,
            timestamp_str: model.timestamp_str,
        }
    }
}

/// Column arrays for a batched `INSERT ... SELECT FROM UNNEST(...)`.
///
/// Postgres rejects an `ON CONFLICT DO UPDATE` that touches the same row twice
/// in one statement, so duplicate ids are collapsed (last write wins).
#[derive(Debug, Default)]
pub struct MessageBatch {
    pub message_ids: Vec<i64>,
    pub channel_ids: Vec<i64>,
    pub author_ids: Vec<i64>,
    pub author_names: Vec<String>,
    pub contents: Vec<String>,
    pub created_ats: Vec<DateTime<Utc>>,
    pub timestamp_strs: Vec<String>,
}

impl MessageBatch {
    pub fn new(messages: &[StoredMessage]) -> Self {
        let mut position: HashMap<Snowflake, usize> = HashMap::with_capacity(messages.len());
        let mut unique: Vec<&StoredMessage> = Vec::with_capacity(messages.len());
        for message in messages {
            match position.get(&message.message_id) {
                Some(&idx) => unique[idx] = message,
                None => {
                    position.insert(message.message_id, unique.len());
                    unique.push(message);
                }
            }
        }

        let mut batch = Self::default();
        for message in unique {
            batch.message_ids.push(message.message_id.into_inner());
            batch.channel_ids.push(message.channel_id.into_inner());
            batch.author_ids.push(message.author_id.into_inner());
            batch.author_names.push(message.author_name.clone());
            batch.contents.push(message.content.clone());
            batch.created_ats.push(message.created_at);
            batch.timestamp_strs.push(message.timestamp_str.clone());
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.message_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }
}
