//! Database models - SQLx-compatible structs for PostgreSQL tables

mod channel_status;
mod message;

pub use channel_status::{ChannelCountModel, ChannelStatusModel};
pub use message::MessageModel;
