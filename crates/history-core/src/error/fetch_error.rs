//! Errors raised by the platform history fetcher

use std::time::Duration;

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Failure of a single history fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The bot has no permission to read the channel
    #[error("Access to channel {0} is forbidden")]
    Forbidden(Snowflake),

    #[error("Channel {0} does not exist or is not visible")]
    NotFound(Snowflake),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "UNKNOWN_CHANNEL",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Timeout(_) => "FETCH_TIMEOUT",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Errors that would likely succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Transport(_)
        )
    }

    /// Errors meaning the channel should be skipped for this operation
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Forbidden(_) | Self::NotFound(_))
    }
}
