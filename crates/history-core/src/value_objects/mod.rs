//! Value objects - immutable types that represent domain concepts

mod snowflake;

pub use snowflake::{Snowflake, SnowflakeParseError};
