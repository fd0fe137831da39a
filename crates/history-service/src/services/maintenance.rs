//! Backfill flag repair
//!
//! The fully-backfilled flag only ever goes from false to true during normal
//! operation. These operations are the explicit way to undo an early mark so
//! the next backfill pass deepens the channel again.

use history_core::{ChannelCount, Snowflake};
use tracing::{info, instrument};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Maintenance service
pub struct MaintenanceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MaintenanceService<'a> {
    /// Create a new MaintenanceService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Clear the flag on one channel
    #[instrument(skip(self))]
    pub async fn reset_backfill(&self, channel_id: Snowflake) -> ServiceResult<()> {
        self.ctx.status_repo().mark_backfilled(channel_id, false).await?;
        info!(channel_id = %channel_id, "Backfill flag reset");
        Ok(())
    }

    /// Clear the flag on every complete channel holding fewer than `threshold` messages
    #[instrument(skip(self))]
    pub async fn reset_suspicious(&self, threshold: i64) -> ServiceResult<Vec<Snowflake>> {
        validate_threshold(threshold)?;
        let reset = self.ctx.status_repo().reset_backfilled_below(threshold).await?;
        info!(threshold, reset = reset.len(), "Reset suspicious backfill flags");
        Ok(reset)
    }

    /// Complete channels holding fewer than `threshold` messages, smallest first
    #[instrument(skip(self))]
    pub async fn suspicious_channels(&self, threshold: i64) -> ServiceResult<Vec<ChannelCount>> {
        validate_threshold(threshold)?;
        let mut suspicious: Vec<ChannelCount> = self
            .ctx
            .status_repo()
            .channel_counts(usize::MAX)
            .await?
            .into_iter()
            .filter(|c| c.is_fully_backfilled && c.message_count < threshold)
            .collect();
        suspicious.sort_by_key(|c| (c.message_count, c.channel_id));
        Ok(suspicious)
    }

    /// Channels with the most stored messages
    pub async fn channel_stats(&self, limit: usize) -> ServiceResult<Vec<ChannelCount>> {
        Ok(self.ctx.status_repo().channel_counts(limit).await?)
    }
}

fn validate_threshold(threshold: i64) -> ServiceResult<()> {
    if threshold <= 0 {
        return Err(ServiceError::validation("threshold must be positive"));
    }
    Ok(())
}
