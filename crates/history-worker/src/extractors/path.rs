//! Path parameter extractors
//!
//! Type-safe extraction of Snowflake IDs from path parameters.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use history_core::Snowflake;
use serde::de::DeserializeOwned;

use crate::response::ApiError;

/// Extract path parameters, rejecting with an `ApiError`
#[derive(Debug, Clone)]
pub struct SnowflakePath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for SnowflakePath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        Ok(SnowflakePath(inner))
    }
}

fn parse_id(raw: &str, name: &str) -> Result<Snowflake, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// Path parameters with channel_id
#[derive(Debug, serde::Deserialize)]
pub struct ChannelIdPath {
    pub channel_id: String,
}

impl ChannelIdPath {
    /// Parse channel_id as Snowflake
    pub fn channel_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.channel_id, "channel_id")
    }
}

/// Path parameters with message_id
#[derive(Debug, serde::Deserialize)]
pub struct MessageIdPath {
    pub message_id: String,
}

impl MessageIdPath {
    /// Parse message_id as Snowflake
    pub fn message_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.message_id, "message_id")
    }
}

/// Path parameters with channel_id and message_id
#[derive(Debug, serde::Deserialize)]
pub struct ChannelMessagePath {
    pub channel_id: String,
    pub message_id: String,
}

impl ChannelMessagePath {
    /// Parse channel_id as Snowflake
    pub fn channel_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.channel_id, "channel_id")
    }

    /// Parse message_id as Snowflake
    pub fn message_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.message_id, "message_id")
    }
}
