//! Maintenance handlers
//!
//! Explicit repair of the fully-backfilled flag.

use axum::{extract::State, Json};
use history_core::ChannelCount;
use history_service::dto::{ApiResponse, ResetResponse, ThresholdRequest};
use history_service::MaintenanceService;

use crate::extractors::{ChannelIdPath, SnowflakePath, ValidatedJson, ValidatedQuery};
use crate::response::ApiResult;
use crate::state::AppState;

/// Complete channels holding fewer than `threshold` messages
///
/// GET /maintenance/suspicious?threshold=
pub async fn suspicious_channels(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ThresholdRequest>,
) -> ApiResult<Json<ApiResponse<Vec<ChannelCount>>>> {
    let channels = MaintenanceService::new(state.service_context())
        .suspicious_channels(query.threshold)
        .await?;
    Ok(Json(ApiResponse::new(channels)))
}

/// Clear the backfill flag of one channel
///
/// POST /maintenance/channels/{channel_id}/reset
pub async fn reset_channel(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<ChannelIdPath>,
) -> ApiResult<Json<ResetResponse>> {
    let channel_id = path.channel_id()?;
    MaintenanceService::new(state.service_context())
        .reset_backfill(channel_id)
        .await?;
    Ok(Json(ResetResponse::new(vec![channel_id])))
}

/// Clear the backfill flag of every suspicious channel
///
/// POST /maintenance/reset-suspicious
pub async fn reset_suspicious(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ThresholdRequest>,
) -> ApiResult<Json<ResetResponse>> {
    let channels = MaintenanceService::new(state.service_context())
        .reset_suspicious(request.threshold)
        .await?;
    Ok(Json(ResetResponse::new(channels)))
}
