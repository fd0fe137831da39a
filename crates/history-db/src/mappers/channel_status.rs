//! ChannelStatus entity <-> model mapper

use history_core::entities::{ChannelCount, ChannelStatus};
use history_core::value_objects::Snowflake;

use crate::models::{ChannelCountModel, ChannelStatusModel};

impl From<ChannelStatusModel> for ChannelStatus {
    fn from(model: ChannelStatusModel) -> Self {
        ChannelStatus {
            channel_id: Snowflake::new(model.channel_id),
            is_fully_backfilled: model.is_fully_backfilled,
            last_updated: model.last_updated,
        }
    }
}

impl From<ChannelCountModel> for ChannelCount {
    fn from(model: ChannelCountModel) -> Self {
        ChannelCount {
            channel_id: Snowflake::new(model.channel_id),
            message_count: model.message_count,
            is_fully_backfilled: model.is_fully_backfilled,
        }
    }
}
