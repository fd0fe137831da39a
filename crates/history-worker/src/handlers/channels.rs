//! Channel handlers
//!
//! Transcript assembly and on-demand backfill and sync.

use axum::{extract::State, Json};
use history_core::RawMessage;
use history_service::dto::{BackfillRequest, ContextRequest, ContextResponse, SyncRequest};
use history_service::{BackfillReport, BackfillService, ContextBuilder, ServiceError, SyncReport, SyncService};

use crate::extractors::{ChannelIdPath, OptionalValidatedJson, SnowflakePath, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Build the transcript preceding a trigger message
///
/// POST /channels/{channel_id}/context
pub async fn build_context(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<ChannelIdPath>,
    ValidatedJson(request): ValidatedJson<ContextRequest>,
) -> ApiResult<Json<ContextResponse>> {
    let channel_id = path.channel_id()?;
    if request.trigger.channel_id != channel_id {
        return Err(ServiceError::validation("Trigger message belongs to another channel").into());
    }

    let ctx = state.service_context();
    let limit = request.limit.unwrap_or(ctx.settings().context.limit);
    let trigger = RawMessage::from(request.trigger);
    let reply_to = request.reply_to.map(RawMessage::from);

    let transcript = ContextBuilder::new(ctx)
        .build(channel_id, &trigger, limit, reply_to.as_ref())
        .await;
    Ok(Json(ContextResponse::from(transcript)))
}

/// Backfill one channel now
///
/// POST /channels/{channel_id}/backfill
pub async fn backfill_channel(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<ChannelIdPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<BackfillRequest>,
) -> ApiResult<Json<BackfillReport>> {
    let ctx = state.service_context();
    let target_depth = request
        .and_then(|r| r.target_depth)
        .unwrap_or(ctx.settings().backfill.target_depth);

    let report = BackfillService::new(ctx)
        .backfill(path.channel_id()?, target_depth)
        .await?;
    Ok(Json(report))
}

/// Reconcile one channel against the platform now
///
/// POST /channels/{channel_id}/sync
pub async fn sync_channel(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<ChannelIdPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<SyncRequest>,
) -> ApiResult<Json<SyncReport>> {
    let ctx = state.service_context();
    let window = request
        .and_then(|r| r.window)
        .unwrap_or(ctx.settings().sync.window);

    let report = SyncService::new(ctx)
        .sync(path.channel_id()?, window)
        .await?;
    Ok(Json(report))
}
