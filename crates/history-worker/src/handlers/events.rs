//! Live message event handlers
//!
//! Write-through endpoints fed by the gateway client.

use axum::{extract::State, http::StatusCode, Json};
use history_core::RawMessage;
use history_service::dto::{
    DeleteResponse, EditMessageRequest, IngestResponse, MessageEventRequest, StoredMessageResponse,
};
use history_service::IngestService;

use crate::extractors::{ChannelMessagePath, MessageIdPath, SnowflakePath, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// New message
///
/// POST /events/messages
///
/// Responds 201 when the message was stored, 200 when it had nothing to store.
pub async fn message_created(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<MessageEventRequest>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let message = RawMessage::from(request);

    let stored = IngestService::new(state.service_context())
        .on_message_create(&message)
        .await?;

    let status = if stored.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(IngestResponse::from(stored))))
}

/// Edited message
///
/// PATCH /events/messages/{message_id}
pub async fn message_edited(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<MessageIdPath>,
    ValidatedJson(request): ValidatedJson<EditMessageRequest>,
) -> ApiResult<Json<StoredMessageResponse>> {
    let message = request.into_raw(path.message_id()?);

    let stored = IngestService::new(state.service_context())
        .on_message_edit(&message)
        .await?;
    Ok(Json(StoredMessageResponse::from(&stored)))
}

/// Deleted message
///
/// DELETE /channels/{channel_id}/messages/{message_id}
pub async fn message_deleted(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<ChannelMessagePath>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = IngestService::new(state.service_context())
        .on_message_delete(path.channel_id()?, path.message_id()?)
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}
