//! Backfill orchestrator
//!
//! Fills the durable store up to a target depth per channel. Each run holds
//! the channel lock and goes through three phases:
//!
//! 1. catch-up: everything newer than the newest stored message
//! 2. cold start: one batch of the newest messages for channels with nothing
//!    stored, so deepen can take over from the oldest of them
//! 3. deepen: walk backwards from the oldest known message until the target
//!    depth is reached or the platform returns an empty page
//!
//! Cold start and deepen are skipped once a channel holds 90% of the target.

use std::time::Duration;

use history_core::{HistoryQuery, Snowflake};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::history::HistoryService;

/// What a single channel backfill did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub channel_id: Snowflake,
    pub stored_before: i64,
    pub stored_after: i64,
    /// Rows written by the catch-up phase
    pub caught_up: usize,
    /// Rows written by cold start and deepen
    pub deepened: usize,
    /// Deepen fetches issued
    pub iterations: usize,
    /// Whether this run set the fully-backfilled flag
    pub marked_complete: bool,
}

/// Outcome of a multi-channel backfill
#[derive(Debug, Default)]
pub struct BackfillSummary {
    pub reports: Vec<BackfillReport>,
    pub failed: Vec<Snowflake>,
}

/// `count` is at least 90% of `target`
pub fn near_target(count: i64, target: i64) -> bool {
    count.saturating_mul(10) >= target.saturating_mul(9)
}

/// Backfill service
pub struct BackfillService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BackfillService<'a> {
    /// Create a new BackfillService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Backfill one channel towards `target_depth` stored messages.
    ///
    /// Concurrent calls for the same channel queue on the channel lock; the
    /// later call usually finds the target met and only runs catch-up.
    #[instrument(skip(self))]
    pub async fn backfill(
        &self,
        channel_id: Snowflake,
        target_depth: i64,
    ) -> ServiceResult<BackfillReport> {
        let _guard = self.ctx.locks().acquire(channel_id).await;
        let repo = self.ctx.message_repo();

        let stored_before = repo.count(channel_id).await?;
        let mut report = BackfillReport {
            channel_id,
            stored_before,
            stored_after: stored_before,
            ..BackfillReport::default()
        };

        let latest = repo.latest_id(channel_id).await?;
        if let Some(latest) = latest {
            report.caught_up = self.catch_up(channel_id, latest).await?;
        }

        let mut count = repo.count(channel_id).await?;
        report.stored_after = count;
        if near_target(count, target_depth) {
            debug!(channel_id = %channel_id, count, target_depth, "Channel near target depth");
            return Ok(report);
        }

        if latest.is_none() {
            let settings = &self.ctx.settings().backfill;
            let limit = usize::try_from(target_depth)
                .unwrap_or(usize::MAX)
                .min(settings.batch_size.max(1));
            let page = HistoryService::new(self.ctx)
                .fetch_and_store(channel_id, HistoryQuery::latest(limit))
                .await?;
            report.deepened += page.stored.len();
            if page.is_empty() {
                self.ctx.status_repo().mark_backfilled(channel_id, true).await?;
                report.marked_complete = true;
                info!(channel_id = %channel_id, "Empty channel marked fully backfilled");
                return Ok(report);
            }
            count = repo.count(channel_id).await?;
        }

        self.deepen(channel_id, target_depth, count, &mut report).await?;
        report.stored_after = repo.count(channel_id).await?;

        info!(
            channel_id = %channel_id,
            before = report.stored_before,
            after = report.stored_after,
            caught_up = report.caught_up,
            deepened = report.deepened,
            complete = report.marked_complete,
            "Backfill finished"
        );
        Ok(report)
    }

    /// Fetch everything newer than `latest`, oldest first
    async fn catch_up(&self, channel_id: Snowflake, latest: Snowflake) -> ServiceResult<usize> {
        let settings = &self.ctx.settings().backfill;
        let history = HistoryService::new(self.ctx);
        let mut cursor = latest;
        let mut written = 0;

        for _ in 0..settings.max_iterations {
            let page = history
                .fetch_and_store(channel_id, HistoryQuery::after(cursor, settings.batch_size))
                .await?;
            written += page.stored.len();

            match page.newest_raw {
                Some(newest) if page.raw_count >= settings.batch_size => cursor = newest,
                _ => break,
            }
        }

        if written > 0 {
            info!(channel_id = %channel_id, written, "Caught up with messages since last run");
        }
        Ok(written)
    }

    /// Walk backwards from the oldest stored message
    async fn deepen(
        &self,
        channel_id: Snowflake,
        target_depth: i64,
        mut count: i64,
        report: &mut BackfillReport,
    ) -> ServiceResult<()> {
        let settings = &self.ctx.settings().backfill;
        if self.ctx.status_repo().is_backfilled(channel_id).await? {
            return Ok(());
        }
        let Some(mut cursor) = self.ctx.message_repo().oldest_id(channel_id).await? else {
            return Ok(());
        };
        let history = HistoryService::new(self.ctx);

        while count < target_depth && report.iterations < settings.max_iterations {
            let remaining = usize::try_from(target_depth - count).unwrap_or(usize::MAX);
            let limit = remaining.min(settings.batch_size.max(1));

            report.iterations += 1;
            let page = history
                .fetch_and_store(channel_id, HistoryQuery::before(cursor, limit))
                .await?;

            let Some(oldest) = page.oldest_raw else {
                self.ctx.status_repo().mark_backfilled(channel_id, true).await?;
                report.marked_complete = true;
                info!(channel_id = %channel_id, count, "Reached start of channel history");
                return Ok(());
            };

            report.deepened += page.stored.len();
            cursor = oldest;
            count = self.ctx.message_repo().count(channel_id).await?;
            debug!(
                channel_id = %channel_id,
                iteration = report.iterations,
                fetched = page.raw_count,
                count,
                "Deepen iteration"
            );

            if count < target_depth {
                tokio::time::sleep(settings.iteration_delay()).await;
            }
        }

        if report.iterations >= settings.max_iterations && count < target_depth {
            warn!(
                channel_id = %channel_id,
                iterations = report.iterations,
                count,
                "Deepen stopped at iteration limit"
            );
        }
        Ok(())
    }

    /// Backfill many channels on a bounded pool.
    ///
    /// Each channel runs in its own task; one failure is logged and never
    /// cancels the others. Every task waits the channel delay before giving
    /// its permit back.
    #[instrument(skip(self, channel_ids), fields(channels = channel_ids.len()))]
    pub async fn backfill_all(&self, channel_ids: &[Snowflake], target_depth: i64) -> BackfillSummary {
        let delay = self.ctx.settings().backfill.channel_delay();
        let mut tasks = JoinSet::new();

        for &channel_id in channel_ids {
            let ctx = self.ctx.clone();
            tasks.spawn(async move {
                let result = run_bounded(&ctx, channel_id, target_depth, delay).await;
                (channel_id, result)
            });
        }

        let mut summary = BackfillSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(report))) => summary.reports.push(report),
                Ok((channel_id, Err(e))) => {
                    if e.is_access_denied() {
                        warn!(channel_id = %channel_id, error = %e, "No access to channel, skipped");
                    } else {
                        error!(channel_id = %channel_id, error = %e, "Channel backfill failed");
                    }
                    summary.failed.push(channel_id);
                }
                Err(e) => error!(error = %e, "Backfill task panicked"),
            }
        }

        info!(
            succeeded = summary.reports.len(),
            failed = summary.failed.len(),
            "Backfill pass complete"
        );
        summary
    }
}

async fn run_bounded(
    ctx: &ServiceContext,
    channel_id: Snowflake,
    target_depth: i64,
    delay: Duration,
) -> ServiceResult<BackfillReport> {
    let _permit = ctx
        .backfill_permits()
        .acquire_owned()
        .await
        .map_err(|_| ServiceError::internal("backfill pool closed"))?;
    let result = BackfillService::new(ctx).backfill(channel_id, target_depth).await;
    tokio::time::sleep(delay).await;
    result
}
