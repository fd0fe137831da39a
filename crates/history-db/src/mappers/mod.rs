//! Entity to model mappers
//!
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `MessageBatch`: column-oriented arrays for a single `UNNEST` upsert

mod channel_status;
mod message;

pub use message::MessageBatch;
