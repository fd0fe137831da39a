//! Domain entities - core business objects

mod channel;
mod context_line;
mod message;

pub use channel::{ChannelCount, ChannelInfo, ChannelStatus};
pub use context_line::ContextLine;
pub use message::{RawMessage, StoredMessage, ATTACHMENT_PLACEHOLDER, EMBED_PLACEHOLDER};
