//! Application state
//!
//! Holds the shared state for the Axum application: the service context and
//! the backend handles probed by the readiness check.

use std::sync::Arc;

use history_cache::SharedRedisPool;
use history_db::PgPool;
use history_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    /// `None` when the store is not PostgreSQL-backed
    database: Option<PgPool>,
    /// `None` when the distributed cache is disabled
    redis: Option<SharedRedisPool>,
}

impl AppState {
    /// Create a new AppState without backend probes
    pub fn new(service_context: ServiceContext) -> Self {
        Self {
            service_context: Arc::new(service_context),
            database: None,
            redis: None,
        }
    }

    /// Attach the PostgreSQL pool checked by readiness
    #[must_use]
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }

    /// Attach the Redis pool checked by readiness
    #[must_use]
    pub fn with_redis(mut self, pool: SharedRedisPool) -> Self {
        self.redis = Some(pool);
        self
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn database(&self) -> Option<&PgPool> {
        self.database.as_ref()
    }

    pub fn redis(&self) -> Option<&SharedRedisPool> {
        self.redis.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &self.service_context)
            .field("database", &self.database.is_some())
            .field("redis", &self.redis.is_some())
            .finish()
    }
}
