//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in history-core.

mod channel_status;
mod error;
mod message;

pub use channel_status::PgChannelStatusRepository;
pub use message::PgMessageRepository;
