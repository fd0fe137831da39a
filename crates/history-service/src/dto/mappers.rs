//! Conversions between DTOs and domain entities

use history_core::{RawMessage, Snowflake, StoredMessage};

use crate::services::Transcript;

use super::requests::{EditMessageRequest, MessageEventRequest};
use super::responses::{ContextResponse, IngestResponse, StoredMessageResponse};

// ============================================================================
// Request Mappers
// ============================================================================

impl From<MessageEventRequest> for RawMessage {
    fn from(request: MessageEventRequest) -> Self {
        let created_at = request.created_at.unwrap_or_else(|| request.id.created_at());
        Self {
            id: request.id,
            channel_id: request.channel_id,
            author_id: request.author_id,
            author_name: request.author_name,
            clean_content: request.clean_content.unwrap_or_else(|| request.content.clone()),
            content: request.content,
            has_attachments: request.has_attachments,
            has_embeds: request.has_embeds,
            created_at,
        }
    }
}

impl EditMessageRequest {
    /// Raw message for an edit of `message_id`
    pub fn into_raw(self, message_id: Snowflake) -> RawMessage {
        RawMessage {
            id: message_id,
            channel_id: self.channel_id,
            author_id: self.author_id,
            author_name: self.author_name,
            clean_content: self.clean_content.unwrap_or_else(|| self.content.clone()),
            content: self.content,
            has_attachments: self.has_attachments,
            has_embeds: self.has_embeds,
            created_at: message_id.created_at(),
        }
    }
}

// ============================================================================
// Response Mappers
// ============================================================================

impl From<&StoredMessage> for StoredMessageResponse {
    fn from(message: &StoredMessage) -> Self {
        Self {
            message_id: message.message_id.to_string(),
            channel_id: message.channel_id.to_string(),
            author_id: message.author_id.to_string(),
            author_name: message.author_name.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
            timestamp_str: message.timestamp_str.clone(),
        }
    }
}

impl From<Option<StoredMessage>> for IngestResponse {
    fn from(message: Option<StoredMessage>) -> Self {
        Self {
            stored: message.is_some(),
            message: message.as_ref().map(StoredMessageResponse::from),
        }
    }
}

impl From<Transcript> for ContextResponse {
    fn from(transcript: Transcript) -> Self {
        Self {
            transcript: transcript.text,
            history_lines: transcript.history_lines,
            source: transcript.tier.to_string(),
        }
    }
}
