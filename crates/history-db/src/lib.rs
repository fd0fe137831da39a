//! # history-db
//!
//! Durable store implementing the repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management
//! - Idempotent schema bootstrap
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use history_db::{create_pool, ensure_schema, DatabaseConfig, PgMessageRepository};
//! use history_core::traits::MessageRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     ensure_schema(&pool).await?;
//!     let messages = PgMessageRepository::new(pool);
//!     let recent = messages.get_recent(channel_id, 50).await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, DatabaseConfig, PgPool};
pub use repositories::{PgChannelStatusRepository, PgMessageRepository};
pub use schema::ensure_schema;
