//! # history-core
//!
//! Domain layer for the channel history subsystem: message entities, the
//! snowflake id type, timestamp labels, and the traits implemented by the
//! durable store and the platform history fetcher.
//! This crate has zero dependencies on infrastructure (database, cache, HTTP).

pub mod entities;
pub mod error;
pub mod formatting;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelCount, ChannelInfo, ChannelStatus, ContextLine, RawMessage, StoredMessage,
    ATTACHMENT_PLACEHOLDER, EMBED_PLACEHOLDER,
};
pub use error::{DomainError, FetchError};
pub use formatting::{absolute_timestamp, current_time_line, relative_label, DEFAULT_TIMEZONE};
pub use traits::{
    ChannelStatusRepository, Closeable, FetchResult, HistoryFetcher, HistoryQuery,
    MessageRepository, RepoResult,
};
pub use value_objects::{Snowflake, SnowflakeParseError};
