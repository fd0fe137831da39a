//! Backfill orchestrator behaviour against a finite scripted platform
//!
//! Run with: cargo test -p integration-tests --test backfill_tests

use std::time::Duration;

use history_core::{ChannelStatusRepository, HistoryQuery, MessageRepository, Snowflake};
use history_service::BackfillService;
use integration_tests::{
    message_id, synthetic_channel, test_settings, Failure, Harness, ScriptedFetcher,
};

const CHANNEL: Snowflake = Snowflake::new(7);

// ============================================================================
// Single channel
// ============================================================================

#[tokio::test]
async fn test_cold_start_small_channel_is_marked_complete() {
    let h = Harness::new(ScriptedFetcher::new().with_messages(synthetic_channel(CHANNEL, 40)));

    let report = BackfillService::new(&h.ctx).backfill(CHANNEL, 100).await.unwrap();

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 40);
    assert!(h.store.is_backfilled(CHANNEL).await.unwrap());
    assert!(report.marked_complete);
    assert_eq!(report.stored_before, 0);
    assert_eq!(report.stored_after, 40);
    assert_eq!(
        h.fetcher.calls_for(CHANNEL),
        vec![
            HistoryQuery::latest(100),
            HistoryQuery::before(message_id(CHANNEL, 1), 60),
        ]
    );
}

#[tokio::test]
async fn test_cold_start_of_large_channel_fits_fetch_timeout() {
    let mut settings = test_settings();
    settings.backfill.fetch_timeout_secs = 1;
    let h = Harness::with_settings(
        ScriptedFetcher::new()
            .with_messages(synthetic_channel(CHANNEL, 5000))
            .with_page_cost(Duration::from_millis(50)),
        settings,
    );

    // A single 3000-message walk would cost 1.5s; batches cost 0.5s each
    let report = BackfillService::new(&h.ctx).backfill(CHANNEL, 3000).await.unwrap();

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 3000);
    assert_eq!(report.iterations, 2);
    assert!(!report.marked_complete);
    assert_eq!(
        h.fetcher.calls_for(CHANNEL),
        vec![
            HistoryQuery::latest(1000),
            HistoryQuery::before(message_id(CHANNEL, 4001), 1000),
            HistoryQuery::before(message_id(CHANNEL, 3001), 1000),
        ]
    );
}

#[tokio::test]
async fn test_catch_up_skips_deepen_when_target_met() {
    let messages = synthetic_channel(CHANNEL, 1005);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages.clone()));
    h.seed(&messages[..1000]).await;

    let report = BackfillService::new(&h.ctx).backfill(CHANNEL, 1000).await.unwrap();

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 1005);
    assert_eq!(report.caught_up, 5);
    assert_eq!(report.deepened, 0);
    assert_eq!(report.iterations, 0);
    assert!(!report.marked_complete);
    assert_eq!(
        h.fetcher.calls_for(CHANNEL),
        vec![HistoryQuery::after(message_id(CHANNEL, 1000), 1000)]
    );
}

#[tokio::test]
async fn test_deepen_pages_backwards_in_batches() {
    let messages = synthetic_channel(CHANNEL, 3000);
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages.clone()));
    h.seed(&messages[2500..]).await;

    let report = BackfillService::new(&h.ctx).backfill(CHANNEL, 2000).await.unwrap();

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 2000);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.deepened, 1500);
    assert!(!report.marked_complete);
    assert_eq!(
        h.fetcher.calls_for(CHANNEL),
        vec![
            HistoryQuery::after(message_id(CHANNEL, 3000), 1000),
            HistoryQuery::before(message_id(CHANNEL, 2501), 1000),
            HistoryQuery::before(message_id(CHANNEL, 1501), 500),
        ]
    );
}

#[tokio::test]
async fn test_deepen_stops_at_iteration_limit() {
    let mut settings = test_settings();
    settings.backfill.max_iterations = 3;
    settings.backfill.batch_size = 10;
    let messages = synthetic_channel(CHANNEL, 1000);
    let h = Harness::with_settings(
        ScriptedFetcher::new().with_messages(messages.clone()),
        settings,
    );
    h.seed(&messages[990..]).await;

    let report = BackfillService::new(&h.ctx).backfill(CHANNEL, 1000).await.unwrap();

    assert_eq!(report.iterations, 3);
    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 40);
    assert!(!h.store.is_backfilled(CHANNEL).await.unwrap());
}

#[tokio::test]
async fn test_repeated_backfill_terminates_at_available_history() {
    let h = Harness::new(ScriptedFetcher::new().with_messages(synthetic_channel(CHANNEL, 60)));
    let service = BackfillService::new(&h.ctx);

    for _ in 0..3 {
        service.backfill(CHANNEL, 100).await.unwrap();
    }

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 60);
    assert!(h.store.is_backfilled(CHANNEL).await.unwrap());
    // Cold start and the empty deepen page, then one catch-up per later run
    assert_eq!(h.fetcher.calls_for(CHANNEL).len(), 4);
}

#[tokio::test]
async fn test_backfill_caps_at_target_for_large_channels() {
    let h = Harness::new(ScriptedFetcher::new().with_messages(synthetic_channel(CHANNEL, 500)));
    let service = BackfillService::new(&h.ctx);

    service.backfill(CHANNEL, 100).await.unwrap();
    service.backfill(CHANNEL, 100).await.unwrap();

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 100);
    assert!(!h.store.is_backfilled(CHANNEL).await.unwrap());
    assert_eq!(h.fetcher.calls_for(CHANNEL).len(), 2);
}

#[tokio::test]
async fn test_contentless_pages_still_advance_cursor() {
    let mut messages = synthetic_channel(CHANNEL, 30);
    for message in &mut messages[..10] {
        message.content.clear();
        message.clean_content.clear();
    }
    let h = Harness::new(ScriptedFetcher::new().with_messages(messages));

    let report = BackfillService::new(&h.ctx).backfill(CHANNEL, 100).await.unwrap();

    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 20);
    assert!(report.marked_complete);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_backfills_of_one_channel_are_serialized() {
    let h = Harness::new(
        ScriptedFetcher::new()
            .with_messages(synthetic_channel(CHANNEL, 40))
            .with_delay(Duration::from_millis(20)),
    );
    let first = BackfillService::new(&h.ctx);
    let second = BackfillService::new(&h.ctx);

    let (a, b) = tokio::join!(first.backfill(CHANNEL, 100), second.backfill(CHANNEL, 100));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(h.fetcher.max_in_flight(), 1);
    assert_eq!(
        h.fetcher.calls_for(CHANNEL),
        vec![
            HistoryQuery::latest(100),
            HistoryQuery::before(message_id(CHANNEL, 1), 60),
            HistoryQuery::after(message_id(CHANNEL, 40), 1000),
        ]
    );
    assert!(a.marked_complete ^ b.marked_complete);
    assert_eq!(h.store.count(CHANNEL).await.unwrap(), 40);
}

#[tokio::test]
async fn test_backfill_all_respects_concurrency_limit() {
    let channels: Vec<Snowflake> = (1..=6).map(Snowflake::new).collect();
    let mut fetcher = ScriptedFetcher::new().with_delay(Duration::from_millis(25));
    for &channel in &channels {
        fetcher = fetcher.with_messages(synthetic_channel(channel, 10));
    }
    let mut settings = test_settings();
    settings.backfill.concurrency = 2;
    let h = Harness::with_settings(fetcher, settings);

    let summary = BackfillService::new(&h.ctx).backfill_all(&channels, 100).await;

    assert_eq!(summary.reports.len(), 6);
    assert!(summary.failed.is_empty());
    assert!(h.fetcher.max_in_flight() <= 2);
    for &channel in &channels {
        assert_eq!(h.store.count(channel).await.unwrap(), 10);
    }
}

#[tokio::test]
async fn test_one_failing_channel_does_not_abort_others() {
    let ok_a = Snowflake::new(1);
    let denied = Snowflake::new(2);
    let ok_b = Snowflake::new(3);
    let fetcher = ScriptedFetcher::new()
        .with_messages(synthetic_channel(ok_a, 10))
        .with_messages(synthetic_channel(denied, 10))
        .with_messages(synthetic_channel(ok_b, 10))
        .failing(denied, Failure::Forbidden);
    let h = Harness::new(fetcher);

    let summary = BackfillService::new(&h.ctx)
        .backfill_all(&[ok_a, denied, ok_b], 100)
        .await;

    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.failed, vec![denied]);
    assert_eq!(h.store.count(ok_a).await.unwrap(), 10);
    assert_eq!(h.store.count(ok_b).await.unwrap(), 10);
    assert_eq!(h.store.count(denied).await.unwrap(), 0);
}
