//! Cache layer errors

use crate::pool::RedisPoolError;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value could not be decoded; readers treat this as a miss
    #[error("Corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<RedisPoolError> for CacheError {
    fn from(err: RedisPoolError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
