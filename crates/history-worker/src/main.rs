//! History worker entry point
//!
//! Run with:
//! ```bash
//! cargo run -p history-worker
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use history_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so it is read before tracing exists
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "History worker failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(
        env = ?config.app.env,
        port = config.server.port,
        channels = config.discord.channel_ids.len(),
        redis = config.redis.enabled,
        "Starting history worker"
    );

    history_worker::server::run(config).await?;
    Ok(())
}
