//! Live event ingestion
//!
//! Applies platform create/edit/delete events to the durable store first and
//! then to the cache chain. Cache failures are logged and ignored; store
//! failures abort the event.

use history_core::{ContextLine, DomainError, RawMessage, Snowflake, StoredMessage};
use tracing::{debug, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Ingest service
pub struct IngestService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> IngestService<'a> {
    /// Create a new IngestService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// New message: upsert and append to the cached window.
    ///
    /// Messages without text, attachments or embeds are skipped and `None` is
    /// returned.
    #[instrument(skip(self, message), fields(channel_id = %message.channel_id, message_id = %message.id))]
    pub async fn on_message_create(&self, message: &RawMessage) -> ServiceResult<Option<StoredMessage>> {
        let tz = self.ctx.settings().context.timezone;
        let Some(stored) = StoredMessage::from_raw(message, tz) else {
            debug!("Skipping message without content");
            return Ok(None);
        };

        self.ctx.message_repo().upsert(&stored).await?;

        if let Err(e) = self
            .ctx
            .cache()
            .append_one(stored.channel_id, ContextLine::from(&stored))
            .await
        {
            warn!(error = %e, "Cache append failed");
        }
        Ok(Some(stored))
    }

    /// Edited message: update content in place.
    ///
    /// The stored creation time wins over the event's; an edit claiming a
    /// different channel than the stored row is rejected.
    #[instrument(skip(self, message), fields(channel_id = %message.channel_id, message_id = %message.id))]
    pub async fn on_message_edit(&self, message: &RawMessage) -> ServiceResult<StoredMessage> {
        let tz = self.ctx.settings().context.timezone;
        let mut stored =
            StoredMessage::from_raw(message, tz).ok_or(DomainError::EmptyContent(message.id))?;

        if let Some(existing) = self.ctx.message_repo().find_by_id(message.id).await? {
            if existing.channel_id != message.channel_id {
                return Err(DomainError::ChannelMismatch {
                    message_id: message.id,
                    channel_id: existing.channel_id,
                }
                .into());
            }
            stored.created_at = existing.created_at;
            stored.timestamp_str = existing.timestamp_str;
        }

        self.ctx.message_repo().upsert(&stored).await?;

        if let Err(e) = self
            .ctx
            .cache()
            .replace_one(stored.channel_id, ContextLine::from(&stored))
            .await
        {
            warn!(error = %e, "Cache replace failed");
        }
        Ok(stored)
    }

    /// Deleted message: remove from the store and every cache tier.
    ///
    /// Returns whether the store held the message.
    #[instrument(skip(self))]
    pub async fn on_message_delete(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> ServiceResult<bool> {
        let existed = self.ctx.message_repo().delete(message_id).await?;

        if let Err(e) = self.ctx.cache().remove_one(channel_id, message_id).await {
            warn!(error = %e, "Cache removal failed");
        }
        Ok(existed)
    }
}
