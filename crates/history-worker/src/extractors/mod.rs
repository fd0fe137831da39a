//! Axum extractors for request handling
//!
//! Validated bodies and query strings, and typed path parameters.

mod path;
mod validated;

pub use path::{ChannelIdPath, ChannelMessagePath, MessageIdPath, SnowflakePath};
pub use validated::{OptionalValidatedJson, ValidatedJson, ValidatedQuery};
