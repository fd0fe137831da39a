//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use history_core::Snowflake;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub cache: CacheConfig,
    pub backfill: BackfillConfig,
    pub sync: SyncConfig,
    pub context: ContextConfig,
    pub discord: DiscordConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
    /// When false the distributed tier is skipped entirely
    pub enabled: bool,
}

/// Cache tier tuning
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    /// Most recent lines kept per channel
    pub max_lines: usize,
    /// Largest single value written to the distributed cache
    pub chunk_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_lines: default_cache_max_lines(),
            chunk_bytes: default_chunk_bytes(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Backfill orchestrator tuning
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Messages to keep per channel
    pub target_depth: i64,
    /// Channels backfilled at once
    pub concurrency: usize,
    /// Largest single deepen fetch
    pub batch_size: usize,
    pub max_iterations: usize,
    pub iteration_delay_ms: u64,
    pub channel_delay_ms: u64,
    pub interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            target_depth: default_target_depth(),
            concurrency: default_backfill_concurrency(),
            batch_size: default_batch_size(),
            max_iterations: default_max_iterations(),
            iteration_delay_ms: default_iteration_delay_ms(),
            channel_delay_ms: default_channel_delay_ms(),
            interval_secs: default_backfill_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl BackfillConfig {
    #[must_use]
    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }

    #[must_use]
    pub fn channel_delay(&self) -> Duration {
        Duration::from_millis(self.channel_delay_ms)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Sync reconciler tuning
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Recent messages compared against the platform
    pub window: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window: default_sync_window(),
        }
    }
}

/// Transcript assembly settings
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub limit: usize,
    pub timezone: Tz,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            limit: default_context_limit(),
            timezone: history_core::DEFAULT_TIMEZONE,
        }
    }
}

/// Chat platform access
#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub api_base: String,
    /// Channels backfilled and synced by the scheduler
    pub channel_ids: Vec<Snowflake>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("channel_ids", &self.channel_ids)
            .finish()
    }
}

// Default value functions
fn default_app_name() -> String {
    "history-worker".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_max_connections() -> u32 {
    16
}

fn default_cache_ttl() -> u64 {
    120
}

fn default_cache_max_lines() -> usize {
    2000
}

fn default_chunk_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_target_depth() -> i64 {
    80_000
}

fn default_backfill_concurrency() -> usize {
    3
}

fn default_batch_size() -> usize {
    1000
}

fn default_max_iterations() -> usize {
    200
}

fn default_iteration_delay_ms() -> u64 {
    1000
}

fn default_channel_delay_ms() -> u64 {
    5000
}

fn default_backfill_interval() -> u64 {
    3600
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_sync_window() -> usize {
    200
}

fn default_context_limit() -> usize {
    100
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        _ => Ok(default()),
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            "" => Ok(default),
            _ => Err(ConfigError::InvalidValue(name, raw)),
        },
        Err(_) => Ok(default),
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Parse a comma separated list of channel ids; blanks are ignored.
pub(crate) fn parse_channel_ids(raw: &str) -> Result<Vec<Snowflake>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Snowflake::parse(s).map_err(|_| ConfigError::InvalidValue("CHANNEL_IDS", s.to_string()))
        })
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let timezone = match env::var("DISPLAY_TIMEZONE") {
            Ok(name) if !name.trim().is_empty() => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidValue("DISPLAY_TIMEZONE", name))?,
            _ => history_core::DEFAULT_TIMEZONE,
        };

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("SERVER_PORT", default_port)?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| default_redis_url()),
                max_connections: parse_var("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
                enabled: parse_bool("USE_REDIS", true)?,
            },
            cache: CacheConfig {
                ttl_secs: parse_var("CACHE_TTL_SECS", default_cache_ttl)?,
                max_lines: parse_var("CACHE_MAX_LINES", default_cache_max_lines)?,
                chunk_bytes: parse_var("CACHE_CHUNK_BYTES", default_chunk_bytes)?,
            },
            backfill: BackfillConfig {
                target_depth: parse_var("BACKFILL_TARGET_DEPTH", default_target_depth)?,
                concurrency: parse_var("BACKFILL_CONCURRENCY", default_backfill_concurrency)?,
                batch_size: parse_var("BACKFILL_BATCH_SIZE", default_batch_size)?,
                max_iterations: parse_var("BACKFILL_MAX_ITERATIONS", default_max_iterations)?,
                iteration_delay_ms: parse_var(
                    "BACKFILL_ITERATION_DELAY_MS",
                    default_iteration_delay_ms,
                )?,
                channel_delay_ms: parse_var("BACKFILL_CHANNEL_DELAY_MS", default_channel_delay_ms)?,
                interval_secs: parse_var("BACKFILL_INTERVAL_SECS", default_backfill_interval)?,
                fetch_timeout_secs: parse_var("FETCH_TIMEOUT_SECS", default_fetch_timeout)?,
            },
            sync: SyncConfig {
                window: parse_var("SYNC_WINDOW", default_sync_window)?,
            },
            context: ContextConfig {
                limit: parse_var("CONTEXT_LIMIT", default_context_limit)?,
                timezone,
            },
            discord: DiscordConfig {
                token: required("DISCORD_TOKEN")?,
                api_base: env::var("DISCORD_API_BASE").unwrap_or_else(|_| default_api_base()),
                channel_ids: env::var("CHANNEL_IDS")
                    .map(|raw| parse_channel_ids(&raw))
                    .unwrap_or_else(|_| Ok(Vec::new()))?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
