//! HTTP surface tests over in-memory collaborators
//!
//! Run with: cargo test -p integration-tests --test api_tests

use history_core::{ChannelStatusRepository, MessageRepository, Snowflake};
use integration_tests::{
    assert_json, message_id, raw_message, synthetic_channel, Harness, ScriptedFetcher, TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

const CHANNEL: Snowflake = Snowflake::new(42);

async fn start(h: &Harness) -> TestServer {
    TestServer::start(h.ctx.clone()).await.expect("server starts")
}

fn event(seq: i64, content: &str) -> Value {
    json!({
        "id": message_id(CHANNEL, seq).to_string(),
        "channel_id": CHANNEL.to_string(),
        "author_id": "1001",
        "author_name": "alice",
        "content": content,
    })
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let h = Harness::new(ScriptedFetcher::new());
    let server = start(&h).await;

    let response = server.get("/health").await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "healthy");

    let body: Value = assert_json(server.get("/health/ready").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"], "healthy");
    assert_eq!(body["checks"]["redis"], "disabled");
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_message_created_stores_text_and_skips_empty() {
    let h = Harness::new(ScriptedFetcher::new());
    let server = start(&h).await;

    let response = server.post("/events/messages", &event(1, "hello")).await.unwrap();
    let body: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(body["stored"], true);
    assert_eq!(body["message"]["content"], "hello");
    assert_eq!(body["message"]["message_id"], message_id(CHANNEL, 1).to_string());

    let response = server.post("/events/messages", &event(2, "")).await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["stored"], false);
    assert!(body.get("message").is_none());

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 1);
}

#[tokio::test]
async fn test_message_created_rejects_invalid_bodies() {
    let h = Harness::new(ScriptedFetcher::new());
    let server = start(&h).await;

    let mut invalid = event(1, "hello");
    invalid["author_name"] = json!("");
    let body: Value = assert_json(
        server.post("/events/messages", &invalid).await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["author_name"].is_array());

    let body: Value = assert_json(
        server.post("/events/messages", &json!({"id": 1})).await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_message_edit_and_delete() {
    let h = Harness::new(ScriptedFetcher::new());
    h.seed(&[raw_message(CHANNEL, 1, "tpyo")]).await;
    let server = start(&h).await;
    let id = message_id(CHANNEL, 1);

    let edit = json!({
        "channel_id": CHANNEL.to_string(),
        "author_id": "1001",
        "author_name": "alice",
        "content": "typo",
    });
    let body: Value = assert_json(
        server
            .patch(&format!("/events/messages/{id}"), &edit)
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(body["content"], "typo");

    let mut moved = edit.clone();
    moved["channel_id"] = json!("999");
    let body: Value = assert_json(
        server
            .patch(&format!("/events/messages/{id}"), &moved)
            .await
            .unwrap(),
        StatusCode::CONFLICT,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "CHANNEL_MISMATCH");

    let path = format!("/channels/{CHANNEL}/messages/{id}");
    let body: Value = assert_json(server.delete(&path).await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(body["deleted"], true);
    let body: Value = assert_json(server.delete(&path).await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(body["deleted"], false);
}

#[tokio::test]
async fn test_invalid_path_ids_are_rejected() {
    let h = Harness::new(ScriptedFetcher::new());
    let server = start(&h).await;

    let body: Value = assert_json(
        server.post_empty("/channels/general/backfill").await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "INVALID_PATH_PARAMETER");
}

// ============================================================================
// Channels
// ============================================================================

#[tokio::test]
async fn test_build_context() {
    let messages = synthetic_channel(CHANNEL, 30);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages));
    let server = start(&h).await;
    let path = format!("/channels/{CHANNEL}/context");

    let request = json!({ "trigger": event(30, "message 30"), "limit": 10 });
    let body: Value = assert_json(server.post(&path, &request).await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(body["source"], "live");
    assert_eq!(body["history_lines"], 10);
    assert!(body["transcript"]
        .as_str()
        .unwrap()
        .contains("alice(1001) says: message 30"));

    let other = format!("/channels/{}/context", Snowflake::new(43));
    let body: Value = assert_json(
        server.post(&other, &request).await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_backfill_and_sync_with_default_settings() {
    let h = Harness::new(ScriptedFetcher::new().with_messages(synthetic_channel(CHANNEL, 40)));
    let server = start(&h).await;

    let body: Value = assert_json(
        server
            .post_empty(&format!("/channels/{CHANNEL}/backfill"))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(body["channel_id"], CHANNEL.to_string());
    assert_eq!(body["stored_after"], 40);
    assert_eq!(body["marked_complete"], true);

    let body: Value = assert_json(
        server
            .post(&format!("/channels/{CHANNEL}/sync"), &json!({ "window": 50 }))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(body["fetched"], 40);
    assert_eq!(body["deleted"], 0);

    let body: Value = assert_json(
        server
            .post(&format!("/channels/{CHANNEL}/sync"), &json!({ "window": 0 }))
            .await
            .unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Maintenance
// ============================================================================

#[tokio::test]
async fn test_maintenance_routes() {
    let h = Harness::new(ScriptedFetcher::new());
    h.seed(&synthetic_channel(CHANNEL, 3)).await;
    h.store.mark_backfilled(CHANNEL, true).await.unwrap();
    let server = start(&h).await;

    let body: Value = assert_json(
        server.get("/maintenance/suspicious?threshold=10").await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(body["data"][0]["channel_id"], CHANNEL.to_string());
    assert_eq!(body["data"][0]["message_count"], 3);

    let body: Value = assert_json(
        server.get("/maintenance/suspicious?threshold=0").await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let body: Value = assert_json(
        server.get("/maintenance/suspicious?threshold=abc").await.unwrap(),
        StatusCode::BAD_REQUEST,
    )
    .await
    .unwrap();
    assert_eq!(body["error"]["code"], "INVALID_QUERY_PARAMETER");

    let body: Value = assert_json(
        server
            .post("/maintenance/reset-suspicious", &json!({ "threshold": 10 }))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(body["count"], 1);
    assert!(!h.store.is_backfilled(CHANNEL).await.unwrap());

    h.store.mark_backfilled(CHANNEL, true).await.unwrap();
    let body: Value = assert_json(
        server
            .post_empty(&format!("/maintenance/channels/{CHANNEL}/reset"))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(body["channels"][0], CHANNEL.to_string());
    assert!(!h.store.is_backfilled(CHANNEL).await.unwrap());
}
