//! Sync reconciliation, live ingestion and flag maintenance
//!
//! Run with: cargo test -p integration-tests --test sync_ingest_tests

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use history_cache::{CacheChain, DistributedCache, InProcessCache, KvStore};
use history_core::{ChannelStatusRepository, MessageRepository, Snowflake};
use history_service::{
    ContextBuilder, IngestService, MaintenanceService, ServiceContextBuilder, SyncService,
};
use integration_tests::{
    message_id, raw_message, synthetic_channel, test_settings, Failure, FailingStore, Harness,
    InMemoryMessageStore, ScriptedFetcher,
};

const CHANNEL: Snowflake = Snowflake::new(21);

fn cached_ids(lines: &[history_core::ContextLine]) -> Vec<Snowflake> {
    lines.iter().map(|l| l.message_id).collect()
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_sync_applies_deletes_edits_and_inserts() {
    let messages = synthetic_channel(CHANNEL, 20);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages.clone()));
    h.seed(&messages).await;

    h.fetcher.remove(CHANNEL, message_id(CHANNEL, 15));
    h.fetcher.push(raw_message(CHANNEL, 18, "edited while offline"));
    h.fetcher.push(raw_message(CHANNEL, 21, "posted while offline"));

    let report = SyncService::new(&h.ctx).sync(CHANNEL, 200).await.unwrap();

    assert_eq!(report.fetched, 20);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.updated, 19);
    assert_eq!(report.inserted, 1);

    assert!(h.store.find_by_id(message_id(CHANNEL, 15)).await.unwrap().is_none());
    let edited = h.store.find_by_id(message_id(CHANNEL, 18)).await.unwrap().unwrap();
    assert_eq!(edited.content, "edited while offline");
    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 20);
}

#[tokio::test]
async fn test_sync_protects_rows_older_than_a_full_window() {
    let messages = synthetic_channel(CHANNEL, 10);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages.clone()));
    h.seed(&messages).await;

    h.fetcher.remove(CHANNEL, message_id(CHANNEL, 9));
    h.fetcher.push(raw_message(CHANNEL, 11, "new"));
    h.fetcher.push(raw_message(CHANNEL, 12, "newer"));

    // Live page is 12, 11, 10, 8, 7; stored 6 falls out of the window but still exists
    let report = SyncService::new(&h.ctx).sync(CHANNEL, 5).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.updated, 3);
    assert!(h.store.find_by_id(message_id(CHANNEL, 9)).await.unwrap().is_none());
    assert!(h.store.find_by_id(message_id(CHANNEL, 6)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_sync_skips_channels_with_nothing_stored() {
    let h = Harness::new(ScriptedFetcher::new().with_messages(synthetic_channel(CHANNEL, 5)));

    let report = SyncService::new(&h.ctx).sync(CHANNEL, 200).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert!(h.fetcher.calls_for(CHANNEL).is_empty());
    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sync_removes_deleted_ids_from_cache() {
    let messages = synthetic_channel(CHANNEL, 20);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages.clone()));
    ContextBuilder::new(&h.ctx)
        .build(CHANNEL, &messages[19], 10, None)
        .await;

    let gone = message_id(CHANNEL, 15);
    h.fetcher.remove(CHANNEL, gone);
    let report = SyncService::new(&h.ctx).sync(CHANNEL, 200).await.unwrap();
    assert_eq!(report.deleted, 1);

    let memory = h.ctx.cache().lookup(CHANNEL).await.unwrap();
    assert!(!cached_ids(&memory.lines).contains(&gone));

    let distributed = DistributedCache::new(
        h.kv.clone() as Arc<dyn KvStore>,
        Duration::from_secs(120),
        2000,
        10 * 1024 * 1024,
    );
    let shared = distributed.get(CHANNEL).await.unwrap().unwrap();
    assert!(!cached_ids(&shared).contains(&gone));
    assert!(cached_ids(&shared).contains(&message_id(CHANNEL, 14)));
}

#[tokio::test]
async fn test_sync_all_isolates_failing_channels() {
    let ok = Snowflake::new(1);
    let denied = Snowflake::new(2);
    let messages = synthetic_channel(ok, 5);
    let denied_messages = synthetic_channel(denied, 5);
    let h = Harness::new(
        ScriptedFetcher::new()
            .with_messages(messages.clone())
            .failing(denied, Failure::Forbidden),
    );
    h.seed(&messages).await;
    h.seed(&denied_messages).await;

    let reports = SyncService::new(&h.ctx).sync_all(&[denied, ok], 200).await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].channel_id, ok);
    assert_eq!(h.store.count(denied).await.unwrap(), 5);
}

// ============================================================================
// Live ingestion
// ============================================================================

#[tokio::test]
async fn test_delete_reaches_every_tier() {
    let messages = synthetic_channel(CHANNEL, 20);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages.clone()));
    ContextBuilder::new(&h.ctx)
        .build(CHANNEL, &messages[19], 10, None)
        .await;
    let target = message_id(CHANNEL, 17);
    assert!(h.store.find_by_id(target).await.unwrap().is_some());

    let ingest = IngestService::new(&h.ctx);
    assert!(ingest.on_message_delete(CHANNEL, target).await.unwrap());
    assert!(!ingest.on_message_delete(CHANNEL, target).await.unwrap());

    assert!(h.store.find_by_id(target).await.unwrap().is_none());
    let memory = h.ctx.cache().lookup(CHANNEL).await.unwrap();
    assert!(!cached_ids(&memory.lines).contains(&target));

    // A fresh process sharing the same key/value store
    let other = CacheChain::new(
        InProcessCache::new(Duration::from_secs(120), 2000),
        Some(DistributedCache::new(
            h.kv.clone() as Arc<dyn KvStore>,
            Duration::from_secs(120),
            2000,
            10 * 1024 * 1024,
        )),
    );
    let shared = other.lookup(CHANNEL).await.unwrap();
    assert_eq!(shared.tier.to_string(), "distributed");
    assert!(!cached_ids(&shared.lines).contains(&target));
}

#[tokio::test]
async fn test_create_appends_to_cache_and_skips_contentless() {
    let h = Harness::new(ScriptedFetcher::new());
    let ingest = IngestService::new(&h.ctx);

    let stored = ingest
        .on_message_create(&raw_message(CHANNEL, 1, "hello"))
        .await
        .unwrap();
    assert!(stored.is_some());

    let mut empty = raw_message(CHANNEL, 2, "");
    empty.clean_content.clear();
    assert!(ingest.on_message_create(&empty).await.unwrap().is_none());

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 1);
    let cached = h.ctx.cache().lookup(CHANNEL).await.unwrap();
    assert_eq!(cached_ids(&cached.lines), vec![message_id(CHANNEL, 1)]);
}

#[tokio::test]
async fn test_edit_keeps_original_creation_time() {
    let original = raw_message(CHANNEL, 5, "tpyo");
    let h = Harness::new(ScriptedFetcher::new());
    h.seed(std::slice::from_ref(&original)).await;

    let mut edit = raw_message(CHANNEL, 5, "typo");
    edit.created_at = Utc::now();
    let stored = IngestService::new(&h.ctx).on_message_edit(&edit).await.unwrap();

    assert_eq!(stored.created_at, original.created_at);
    let row = h.store.find_by_id(original.id).await.unwrap().unwrap();
    assert_eq!(row.content, "typo");
    assert_eq!(row.created_at, original.created_at);
}

#[tokio::test]
async fn test_edit_rejects_channel_mismatch_and_empty_content() {
    let original = raw_message(CHANNEL, 5, "hello");
    let h = Harness::new(ScriptedFetcher::new());
    h.seed(std::slice::from_ref(&original)).await;
    let ingest = IngestService::new(&h.ctx);

    let mut moved = original.clone();
    moved.channel_id = Snowflake::new(99);
    let err = ingest.on_message_edit(&moved).await.unwrap_err();
    assert_eq!(err.status_code(), 409);

    let mut blank = original.clone();
    blank.content.clear();
    blank.clean_content.clear();
    let err = ingest.on_message_edit(&blank).await.unwrap_err();
    assert_eq!(err.status_code(), 400);

    let row = h.store.find_by_id(original.id).await.unwrap().unwrap();
    assert_eq!(row.content, "hello");
}

#[tokio::test]
async fn test_store_failure_aborts_event_before_cache() {
    let status = Arc::new(InMemoryMessageStore::new());
    let ctx = ServiceContextBuilder::new()
        .message_repo(Arc::new(FailingStore))
        .status_repo(status)
        .fetcher(Arc::new(ScriptedFetcher::new()))
        .cache(Arc::new(CacheChain::memory_only(InProcessCache::new(
            Duration::from_secs(120),
            2000,
        ))))
        .settings(test_settings())
        .build()
        .unwrap();

    let result = IngestService::new(&ctx)
        .on_message_create(&raw_message(CHANNEL, 1, "hello"))
        .await;

    assert!(result.is_err());
    assert!(ctx.cache().stale(CHANNEL).is_none());
}

// ============================================================================
// Maintenance
// ============================================================================

#[tokio::test]
async fn test_suspicious_channels_are_listed_and_reset() {
    let small = Snowflake::new(31);
    let tiny = Snowflake::new(32);
    let large = Snowflake::new(33);
    let h = Harness::new(ScriptedFetcher::new());
    h.seed(&synthetic_channel(small, 10)).await;
    h.seed(&synthetic_channel(tiny, 3)).await;
    h.seed(&synthetic_channel(large, 50)).await;
    for channel in [small, tiny, large] {
        h.store.mark_backfilled(channel, true).await.unwrap();
    }
    let maintenance = MaintenanceService::new(&h.ctx);

    let suspicious = maintenance.suspicious_channels(20).await.unwrap();
    let listed: Vec<Snowflake> = suspicious.iter().map(|c| c.channel_id).collect();
    assert_eq!(listed, vec![tiny, small]);

    let reset = maintenance.reset_suspicious(20).await.unwrap();
    assert_eq!(reset, vec![small, tiny]);
    assert!(!h.store.is_backfilled(small).await.unwrap());
    assert!(!h.store.is_backfilled(tiny).await.unwrap());
    assert!(h.store.is_backfilled(large).await.unwrap());

    assert!(maintenance.suspicious_channels(20).await.unwrap().is_empty());

    let top: Vec<Snowflake> = maintenance
        .channel_stats(2)
        .await
        .unwrap()
        .iter()
        .map(|c| c.channel_id)
        .collect();
    assert_eq!(top, vec![large, small]);
    assert_eq!(maintenance.reset_suspicious(0).await.unwrap_err().status_code(), 400);
}

#[tokio::test]
async fn test_reset_single_channel_flag() {
    let h = Harness::new(ScriptedFetcher::new());
    h.store.mark_backfilled(CHANNEL, true).await.unwrap();

    MaintenanceService::new(&h.ctx).reset_backfill(CHANNEL).await.unwrap();

    assert!(!h.store.is_backfilled(CHANNEL).await.unwrap());
}
