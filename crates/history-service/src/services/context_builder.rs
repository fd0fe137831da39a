//! Transcript assembly for the downstream agent

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use history_cache::LookupTier;
use history_core::{current_time_line, relative_label, ChannelInfo, ContextLine, RawMessage, Snowflake};
use serde::Serialize;
use tracing::{instrument, warn};

use super::context::ServiceContext;
use super::history::HistoryService;

/// Closing instruction appended after the triggering message
pub const CURRENT_MESSAGE_NOTICE: &str = "IMPORTANT: The message above is the CURRENT message that you need to respond to. \
     Everything before it is conversation history.";

/// An assembled transcript
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub text: String,
    /// History lines included, excluding reply context and the trigger
    pub history_lines: usize,
    /// Which source served the history
    #[serde(serialize_with = "serialize_tier")]
    pub tier: LookupTier,
}

fn serialize_tier<S: serde::Serializer>(tier: &LookupTier, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(tier)
}

/// Context builder
pub struct ContextBuilder<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ContextBuilder<'a> {
    /// Create a new ContextBuilder
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Build the transcript that precedes `trigger`.
    ///
    /// History comes strictly from before the trigger, so a trigger already
    /// appended by the live path never shows up twice. Platform failures
    /// degrade the history instead of failing the build.
    #[instrument(skip(self, trigger, reply_to), fields(trigger_id = %trigger.id))]
    pub async fn build(
        &self,
        channel_id: Snowflake,
        trigger: &RawMessage,
        limit: usize,
        reply_to: Option<&RawMessage>,
    ) -> Transcript {
        let lookup = HistoryService::new(self.ctx)
            .recent_before(channel_id, Some(trigger.id), limit.saturating_add(1))
            .await;

        let mut history: Vec<ContextLine> = lookup
            .lines
            .into_iter()
            .filter(|line| line.message_id != trigger.id)
            .collect();
        let start = history.len().saturating_sub(limit);
        history.drain(..start);

        let info = self.channel_info(channel_id).await;
        let tz = self.ctx.settings().context.timezone;
        let text = render(&info, &history, trigger, reply_to, Utc::now(), tz);

        Transcript {
            text,
            history_lines: history.len(),
            tier: lookup.tier,
        }
    }

    async fn channel_info(&self, channel_id: Snowflake) -> ChannelInfo {
        let timeout = self.ctx.settings().backfill.fetch_timeout();
        match tokio::time::timeout(timeout, self.ctx.fetcher().channel_info(channel_id)).await {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                warn!(channel_id = %channel_id, error = %e, "Channel info unavailable");
                ChannelInfo::unknown(channel_id)
            }
            Err(_) => {
                warn!(channel_id = %channel_id, "Channel info timed out");
                ChannelInfo::unknown(channel_id)
            }
        }
    }
}

fn message_text(message: &RawMessage) -> String {
    message
        .storable_content()
        .unwrap_or_else(|| message.content.clone())
}

/// Lay out the transcript text
pub fn render(
    info: &ChannelInfo,
    history: &[ContextLine],
    trigger: &RawMessage,
    reply_to: Option<&RawMessage>,
    now: DateTime<Utc>,
    tz: Tz,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Channel ID: {}\n", info.id));
    out.push_str(&format!("Channel: {}\n", info.name));
    out.push_str(&format!("Guild: {}\n", info.guild_label()));
    out.push_str("----\n");
    out.push_str(&format!("Current Time: {}\n", current_time_line(now, tz)));
    out.push_str("Timestamps are relative to this time.\n\n");
    out.push_str("Conversation History:\n");

    for line in history {
        out.push_str(&line.render(now, tz));
        out.push('\n');
    }

    if let Some(reply) = reply_to {
        let line = ContextLine {
            message_id: reply.id,
            author_id: reply.author_id,
            author_name: reply.author_name.clone(),
            content: message_text(reply),
            created_at: reply.created_at,
        };
        out.push_str("\n[REPLY CONTEXT]\n");
        out.push_str("The user is replying to:\n");
        out.push_str(&line.render(now, tz));
        out.push_str("\n----------------\n");
    }

    out.push_str(&format!(
        "\n{} {}({}) says: {}\n\n",
        relative_label(trigger.created_at, now, tz),
        trigger.author_name,
        trigger.author_id,
        message_text(trigger)
    ));
    out.push_str(CURRENT_MESSAGE_NOTICE);
    out
}
