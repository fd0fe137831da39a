//! # history-cache
//!
//! Cache tiers in front of the durable message store.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Key/Value Port**: `KvStore` trait with Redis and in-memory backends
//! - **Chunking**: values larger than the backend limit are split across keys
//! - **In-Process Tier**: short-TTL per-channel windows held in a `DashMap`
//! - **Cache Chain**: memory → distributed lookup that reports the serving tier
//!
//! ## Example
//!
//! ```ignore
//! use history_cache::{CacheChain, DistributedCache, InProcessCache, RedisPool, RedisPoolConfig};
//!
//! let pool = Arc::new(RedisPool::new(RedisPoolConfig::default())?);
//! let distributed = DistributedCache::new(pool, ttl, max_lines, 10 * 1024 * 1024);
//! let chain = CacheChain::new(InProcessCache::new(ttl, max_lines), Some(distributed));
//!
//! if let Some(hit) = chain.lookup(channel_id).await {
//!     tracing::debug!(tier = %hit.tier, lines = hit.lines.len(), "cache hit");
//! }
//! ```

pub mod chunked;
pub mod error;
pub mod keys;
pub mod kv;
pub mod pool;
pub mod tiers;

pub use chunked::{combine, split, ChunkMeta, ChunkedStore};
pub use error::{CacheError, CacheResult};
pub use kv::{KvStore, MemoryKv};
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool};
pub use tiers::{CacheChain, DistributedCache, InProcessCache, Lookup, LookupTier};
