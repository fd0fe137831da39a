//! # history-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, AppSettings, BackfillConfig, CacheConfig, ConfigError, ContextConfig,
    DatabaseConfig, DiscordConfig, Environment, RedisConfig, ServerConfig, SyncConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    try_init_tracing_with_config, TracingConfig, TracingError,
};
