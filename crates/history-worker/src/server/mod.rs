//! Server setup and initialization
//!
//! Wires the store, cache tiers and fetcher into a `ServiceContext`, then runs
//! the scheduler and the HTTP server until ctrl-c.

use std::sync::Arc;

use axum::Router;
use history_cache::{CacheChain, DistributedCache, InProcessCache, KvStore, RedisPool};
use history_common::{AppConfig, AppError};
use history_core::Closeable;
use history_db::{
    create_pool, ensure_schema, DatabaseConfig, PgChannelStatusRepository, PgMessageRepository,
};
use history_service::{ServiceContext, ServiceContextBuilder, ServiceSettings};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::discord::DiscordFetcher;
use crate::middleware::apply_middleware;
use crate::routes::{create_router, health_routes};
use crate::scheduler::Scheduler;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router().merge(health_routes());
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Everything the worker runs on, plus what must be closed on shutdown
pub struct Runtime {
    pub context: ServiceContext,
    pub state: AppState,
    pub closeables: Vec<Arc<dyn Closeable>>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("state", &self.state)
            .field(
                "closeables",
                &self.closeables.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Initialize all dependencies
pub async fn build_runtime(config: &AppConfig) -> Result<Runtime, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let message_repo = Arc::new(PgMessageRepository::new(pool.clone()));
    let status_repo = Arc::new(PgChannelStatusRepository::new(pool.clone()));

    let memory = InProcessCache::new(config.cache.ttl(), config.cache.max_lines);
    let redis = if config.redis.enabled {
        let redis = Arc::new(
            RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?,
        );
        if let Err(e) = redis.health_check().await {
            warn!(error = %e, "Redis unreachable at startup, cache reads will miss until it recovers");
        }
        Some(redis)
    } else {
        info!("Distributed cache disabled");
        None
    };
    let distributed = redis.as_ref().map(|pool| {
        DistributedCache::new(
            Arc::clone(pool) as Arc<dyn KvStore>,
            config.cache.ttl(),
            config.cache.max_lines,
            config.cache.chunk_bytes,
        )
    });
    let cache = Arc::new(CacheChain::new(memory, distributed));

    let fetcher = Arc::new(DiscordFetcher::from_config(config)?);

    let context = ServiceContextBuilder::new()
        .message_repo(message_repo.clone())
        .status_repo(status_repo)
        .fetcher(fetcher.clone())
        .cache(cache)
        .settings(ServiceSettings::from(config))
        .build()?;

    let mut state = AppState::new(context.clone()).with_database(pool);
    let mut closeables: Vec<Arc<dyn Closeable>> = vec![fetcher as Arc<dyn Closeable>];
    if let Some(redis) = redis {
        state = state.with_redis(redis.clone());
        closeables.push(redis);
    }
    closeables.push(message_repo);

    Ok(Runtime {
        context,
        state,
        closeables,
    })
}

/// Run the scheduler and the HTTP server until ctrl-c
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let runtime = build_runtime(&config).await?;

    let addr = config.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;
    info!("Server listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(runtime.context.clone(), config.discord.channel_ids.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let mut server_shutdown = shutdown_rx;
    let server = axum::serve(listener, create_app(runtime.state)).with_graceful_shutdown(
        async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        },
    );
    let mut server_task = tokio::spawn(async move { server.await });

    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            None
        }
        joined = &mut server_task => Some(joined),
    };

    let _ = shutdown_tx.send(true);
    let server_result = match finished {
        Some(joined) => joined,
        None => server_task.await,
    };
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Scheduler task panicked");
    }

    close_all(&runtime.closeables).await;

    match server_result {
        Ok(Ok(())) => {
            info!("History worker stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(AppError::Internal(e.into())),
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

/// Close collaborators in order, logging each
pub async fn close_all(closeables: &[Arc<dyn Closeable>]) {
    for closeable in closeables {
        closeable.close().await;
        info!(resource = closeable.name(), "Closed");
    }
}
