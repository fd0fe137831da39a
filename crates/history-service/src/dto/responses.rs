//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use history_core::Snowflake;
use serde::Serialize;

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Message Responses
// ============================================================================

/// A stored message row
#[derive(Debug, Clone, Serialize)]
pub struct StoredMessageResponse {
    pub message_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub timestamp_str: String,
}

/// Result of a create or edit event
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    /// False when the message had nothing worth storing
    pub stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<StoredMessageResponse>,
}

/// Result of a delete event
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

// ============================================================================
// Channel Responses
// ============================================================================

/// An assembled transcript
#[derive(Debug, Clone, Serialize)]
pub struct ContextResponse {
    pub transcript: String,
    pub history_lines: usize,
    /// Cache tier or source that served the history
    pub source: String,
}

// ============================================================================
// Maintenance Responses
// ============================================================================

/// Channels whose backfill flag was cleared
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub channels: Vec<Snowflake>,
    pub count: usize,
}

impl ResetResponse {
    pub fn new(channels: Vec<Snowflake>) -> Self {
        Self {
            count: channels.len(),
            channels,
        }
    }
}

// ============================================================================
// Health Responses
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each backend
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub redis: String,
}

impl ReadinessResponse {
    /// `redis_healthy` is `None` when the distributed cache is disabled
    pub fn ready(database_healthy: bool, redis_healthy: Option<bool>) -> Self {
        let all_healthy = database_healthy && redis_healthy.unwrap_or(true);
        let label = |healthy: bool| if healthy { "healthy" } else { "unhealthy" }.to_string();
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: label(database_healthy),
                redis: redis_healthy.map_or_else(|| "disabled".to_string(), label),
            },
        }
    }
}
