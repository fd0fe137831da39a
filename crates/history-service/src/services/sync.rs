//! Sync reconciler
//!
//! Compares the newest stored messages of a channel with the live platform
//! page and removes rows deleted while the process was offline. Edits are
//! picked up as a side effect of the write-through fetch.

use std::collections::HashSet;

use history_core::{HistoryQuery, Snowflake};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::history::HistoryService;

/// What a channel sync changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub channel_id: Snowflake,
    /// Messages returned by the platform
    pub fetched: usize,
    /// Stored rows refreshed from the live page
    pub updated: usize,
    /// Live messages that were not stored yet
    pub inserted: usize,
    /// Stored rows no longer present on the platform
    pub deleted: usize,
}

/// Sync service
pub struct SyncService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SyncService<'a> {
    /// Create a new SyncService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Reconcile the newest `window` messages of a channel
    #[instrument(skip(self))]
    pub async fn sync(&self, channel_id: Snowflake, window: usize) -> ServiceResult<SyncReport> {
        let mut report = SyncReport {
            channel_id,
            ..SyncReport::default()
        };

        let stored_ids = self.ctx.message_repo().recent_ids(channel_id, window).await?;
        if stored_ids.is_empty() {
            info!(channel_id = %channel_id, "Nothing stored, skipping sync");
            return Ok(report);
        }

        let page = HistoryService::new(self.ctx)
            .fetch_and_store(channel_id, HistoryQuery::latest(window))
            .await?;
        report.fetched = page.raw_count;

        let stored: HashSet<Snowflake> = stored_ids.iter().copied().collect();
        let written: HashSet<Snowflake> = page.stored.iter().map(|m| m.message_id).collect();
        report.updated = written.intersection(&stored).count();
        report.inserted = written.difference(&stored).count();

        let deleted = deleted_ids(&stored_ids, &page.raw_ids, window);
        if !deleted.is_empty() {
            report.deleted = usize::try_from(
                self.ctx.message_repo().delete_many(channel_id, &deleted).await?,
            )
            .unwrap_or(usize::MAX);
            if let Err(e) = self.ctx.cache().remove_many(channel_id, &deleted).await {
                warn!(channel_id = %channel_id, error = %e, "Cache removal after sync failed");
            }
        }

        info!(
            channel_id = %channel_id,
            updated = report.updated,
            inserted = report.inserted,
            deleted = report.deleted,
            "Channel synced"
        );
        Ok(report)
    }

    /// Sync channels one after another, logging per-channel failures
    #[instrument(skip(self, channel_ids), fields(channels = channel_ids.len()))]
    pub async fn sync_all(&self, channel_ids: &[Snowflake], window: usize) -> Vec<SyncReport> {
        let mut reports = Vec::with_capacity(channel_ids.len());
        let mut failed = 0usize;

        for &channel_id in channel_ids {
            match self.sync(channel_id, window).await {
                Ok(report) => reports.push(report),
                Err(e) if e.is_access_denied() => {
                    warn!(channel_id = %channel_id, error = %e, "No access to channel, sync skipped");
                    failed += 1;
                }
                Err(e) => {
                    error!(channel_id = %channel_id, error = %e, "Channel sync failed");
                    failed += 1;
                }
            }
        }

        info!(synced = reports.len(), failed, "Sync pass complete");
        reports
    }
}

/// Stored ids missing from the live page.
///
/// When the live page was full it only covers the newest part of the
/// channel, so stored ids older than its oldest entry are left alone.
fn deleted_ids(stored: &[Snowflake], live: &[Snowflake], window: usize) -> Vec<Snowflake> {
    let live_set: HashSet<Snowflake> = live.iter().copied().collect();
    let floor = if live.len() >= window {
        live.iter().copied().min()
    } else {
        None
    };

    stored
        .iter()
        .copied()
        .filter(|id| !live_set.contains(id))
        .filter(|id| floor.map_or(true, |oldest| *id >= oldest))
        .collect()
}
