//! Startup and periodic backfill scheduling
//!
//! On start the configured channels are backfilled and then reconciled once.
//! After that a backfill pass repeats every `BACKFILL_INTERVAL_SECS`, which
//! mostly amounts to catch-up since channels settle near their target depth.

use std::sync::Arc;
use std::time::Duration;

use history_core::Snowflake;
use history_service::{BackfillService, BackfillSummary, ServiceContext, SyncReport, SyncService};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, instrument};

/// Drives backfill and sync for the configured channels
#[derive(Debug, Clone)]
pub struct Scheduler {
    ctx: ServiceContext,
    channel_ids: Arc<[Snowflake]>,
}

impl Scheduler {
    pub fn new(ctx: ServiceContext, channel_ids: Vec<Snowflake>) -> Self {
        Self {
            ctx,
            channel_ids: channel_ids.into(),
        }
    }

    /// Backfill every channel, then reconcile every channel
    #[instrument(skip(self), fields(channels = self.channel_ids.len()))]
    pub async fn startup(&self) -> (BackfillSummary, Vec<SyncReport>) {
        let summary = self.backfill_pass().await;
        let window = self.ctx.settings().sync.window;
        let reports = SyncService::new(&self.ctx)
            .sync_all(&self.channel_ids, window)
            .await;
        info!(
            synced = reports.len(),
            deleted = reports.iter().map(|r| r.deleted).sum::<usize>(),
            "Startup sync finished"
        );
        (summary, reports)
    }

    /// One backfill pass over all channels
    pub async fn backfill_pass(&self) -> BackfillSummary {
        let target = self.ctx.settings().backfill.target_depth;
        let summary = BackfillService::new(&self.ctx)
            .backfill_all(&self.channel_ids, target)
            .await;
        info!(
            succeeded = summary.reports.len(),
            failed = summary.failed.len(),
            "Backfill pass finished"
        );
        summary
    }

    /// Run startup work and the periodic loop until `shutdown` turns true.
    ///
    /// In-flight work is dropped when shutdown is signalled; every step is
    /// safe to repeat on the next start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.channel_ids.is_empty() {
            info!("No channels configured, scheduler idle");
            return;
        }

        tokio::select! {
            _ = self.startup() => {}
            _ = shutdown.wait_for(|stop| *stop) => {
                info!("Scheduler stopped during startup");
                return;
            }
        }

        let period = self.ctx.settings().backfill.interval().max(Duration::from_secs(1));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }
            tokio::select! {
                _ = self.backfill_pass() => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }
        }
        info!("Scheduler stopped");
    }
}
