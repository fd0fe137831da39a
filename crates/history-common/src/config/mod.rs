//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, BackfillConfig, CacheConfig, ConfigError, ContextConfig,
    DatabaseConfig, DiscordConfig, Environment, RedisConfig, ServerConfig, SyncConfig,
};
