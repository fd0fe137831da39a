//! Route definitions
//!
//! Event ingestion, channel operations and maintenance routes.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::{channels, events, health, maintenance};
use crate::state::AppState;

/// Create the router with every operational route
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(event_routes())
        .merge(channel_routes())
        .merge(maintenance_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Live message events
fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events/messages", post(events::message_created))
        .route("/events/messages/:message_id", patch(events::message_edited))
        .route(
            "/channels/:channel_id/messages/:message_id",
            delete(events::message_deleted),
        )
}

/// Per-channel operations
fn channel_routes() -> Router<AppState> {
    Router::new()
        .route("/channels/:channel_id/context", post(channels::build_context))
        .route("/channels/:channel_id/backfill", post(channels::backfill_channel))
        .route("/channels/:channel_id/sync", post(channels::sync_channel))
}

/// Backfill flag repair
fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route("/maintenance/suspicious", get(maintenance::suspicious_channels))
        .route(
            "/maintenance/channels/:channel_id/reset",
            post(maintenance::reset_channel),
        )
        .route("/maintenance/reset-suspicious", post(maintenance::reset_suspicious))
}
