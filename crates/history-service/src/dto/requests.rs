//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.
//! Snowflake ids are accepted as strings or numbers.

use chrono::{DateTime, Utc};
use history_core::Snowflake;
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Event Requests
// ============================================================================

/// A platform message, as delivered by the gateway client
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageEventRequest {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,

    #[validate(length(min = 1, max = 100, message = "Author name must be 1-100 characters"))]
    pub author_name: String,

    #[validate(length(max = 4000, message = "Content must be at most 4000 characters"))]
    #[serde(default)]
    pub content: String,

    /// Content with mentions resolved; falls back to `content`
    #[serde(default)]
    pub clean_content: Option<String>,

    #[serde(default)]
    pub has_attachments: bool,

    #[serde(default)]
    pub has_embeds: bool,

    /// Defaults to the time encoded in the message id
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// New content for an existing message; the id comes from the path
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditMessageRequest {
    pub channel_id: Snowflake,
    pub author_id: Snowflake,

    #[validate(length(min = 1, max = 100, message = "Author name must be 1-100 characters"))]
    pub author_name: String,

    #[validate(length(max = 4000, message = "Content must be at most 4000 characters"))]
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub clean_content: Option<String>,

    #[serde(default)]
    pub has_attachments: bool,

    #[serde(default)]
    pub has_embeds: bool,
}

// ============================================================================
// Channel Requests
// ============================================================================

/// Build a transcript for a triggering message
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContextRequest {
    #[validate(nested)]
    pub trigger: MessageEventRequest,

    /// Defaults to the configured context limit
    #[validate(range(min = 1, max = 2000, message = "Limit must be between 1 and 2000"))]
    pub limit: Option<usize>,

    #[validate(nested)]
    pub reply_to: Option<MessageEventRequest>,
}

/// Run a backfill for one channel
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BackfillRequest {
    /// Defaults to the configured target depth
    #[validate(range(min = 1, message = "Target depth must be positive"))]
    pub target_depth: Option<i64>,
}

/// Reconcile one channel against the platform
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SyncRequest {
    /// Defaults to the configured sync window
    #[validate(range(min = 1, max = 10000, message = "Window must be between 1 and 10000"))]
    pub window: Option<usize>,
}

// ============================================================================
// Maintenance Requests
// ============================================================================

/// Message-count threshold below which a complete channel is suspicious
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ThresholdRequest {
    #[validate(range(min = 1, message = "Threshold must be positive"))]
    pub threshold: i64,
}
