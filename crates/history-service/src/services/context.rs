//! Service context - dependency container for services
//!
//! Holds the repositories, the history fetcher, the cache chain and the
//! shared concurrency primitives needed by services.

use std::sync::Arc;

use history_cache::{CacheChain, InProcessCache};
use history_common::{AppConfig, BackfillConfig, CacheConfig, ContextConfig, SyncConfig};
use history_core::traits::{ChannelStatusRepository, HistoryFetcher, MessageRepository};
use tokio::sync::Semaphore;

use super::error::{ServiceError, ServiceResult};
use super::locks::ChannelLocks;

/// Tuning shared by all services
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub backfill: BackfillConfig,
    pub sync: SyncConfig,
    pub context: ContextConfig,
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            backfill: config.backfill.clone(),
            sync: config.sync.clone(),
            context: config.context.clone(),
        }
    }
}

/// Service context containing all dependencies
///
/// Cheap to clone; every field is shared. Clones handed to spawned
/// backfill tasks see the same locks, permits and cache.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    message_repo: Arc<dyn MessageRepository>,
    status_repo: Arc<dyn ChannelStatusRepository>,

    // Platform
    fetcher: Arc<dyn HistoryFetcher>,

    // Cache tiers
    cache: Arc<CacheChain>,

    // Concurrency
    locks: ChannelLocks,
    backfill_permits: Arc<Semaphore>,

    settings: Arc<ServiceSettings>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        status_repo: Arc<dyn ChannelStatusRepository>,
        fetcher: Arc<dyn HistoryFetcher>,
        cache: Arc<CacheChain>,
        settings: ServiceSettings,
    ) -> Self {
        let permits = settings.backfill.concurrency.max(1);
        Self {
            message_repo,
            status_repo,
            fetcher,
            cache,
            locks: ChannelLocks::new(),
            backfill_permits: Arc::new(Semaphore::new(permits)),
            settings: Arc::new(settings),
        }
    }

    // === Repositories ===

    /// Get the message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    /// Get the channel status repository
    pub fn status_repo(&self) -> &dyn ChannelStatusRepository {
        self.status_repo.as_ref()
    }

    // === Platform ===

    /// Get the platform history fetcher
    pub fn fetcher(&self) -> &dyn HistoryFetcher {
        self.fetcher.as_ref()
    }

    // === Cache ===

    /// Get the cache chain
    pub fn cache(&self) -> &CacheChain {
        self.cache.as_ref()
    }

    // === Concurrency ===

    /// Get the per-channel lock map
    pub fn locks(&self) -> &ChannelLocks {
        &self.locks
    }

    /// Global bound on concurrently running backfills
    pub fn backfill_permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.backfill_permits)
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("fetcher", &"dyn HistoryFetcher")
            .field("cache", &self.cache)
            .field("locked_channels", &self.locks.len())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    message_repo: Option<Arc<dyn MessageRepository>>,
    status_repo: Option<Arc<dyn ChannelStatusRepository>>,
    fetcher: Option<Arc<dyn HistoryFetcher>>,
    cache: Option<Arc<CacheChain>>,
    settings: ServiceSettings,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn status_repo(mut self, repo: Arc<dyn ChannelStatusRepository>) -> Self {
        self.status_repo = Some(repo);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn HistoryFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn cache(mut self, cache: Arc<CacheChain>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the ServiceContext
    ///
    /// Without an explicit cache chain, an in-process-only chain with default
    /// tuning is used.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let cache = self.cache.unwrap_or_else(|| {
            let defaults = CacheConfig::default();
            Arc::new(CacheChain::memory_only(InProcessCache::new(
                defaults.ttl(),
                defaults.max_lines,
            )))
        });

        Ok(ServiceContext::new(
            self.message_repo
                .ok_or_else(|| ServiceError::validation("message_repo is required"))?,
            self.status_repo
                .ok_or_else(|| ServiceError::validation("status_repo is required"))?,
            self.fetcher
                .ok_or_else(|| ServiceError::validation("fetcher is required"))?,
            cache,
            self.settings,
        ))
    }
}
