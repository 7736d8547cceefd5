//! Airlift acquisition server binary.

use airlift_cache::RedisManager;
use airlift_core::config::AppConfig;
use airlift_server::{AppState, create_router};
use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Airlift - acquisition service for code-push style OTA updates
#[derive(Parser, Debug)]
#[command(name = "airliftd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "AIRLIFT_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("Airlift v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration: optional TOML file, AIRLIFT_ environment overrides,
    // then the platform's historical variables (REDIS_HOST etc.) on top.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed("AIRLIFT_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .apply_platform_env()
        .map_err(anyhow::Error::msg)
        .context("invalid platform environment configuration")?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    // Register Prometheus metrics
    airlift_server::metrics::register_metrics();

    // Initialize the release-history backend and verify connectivity before
    // accepting requests, so misconfiguration fails at startup instead of on
    // the first poll.
    let storage = airlift_storage::from_config(&config.storage)
        .await
        .context("failed to initialize release-history storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Release-history storage initialized");

    // Connect the distributed cache; an unreachable endpoint that is
    // explicitly configured is fatal, absent configuration disables caching.
    let redis = RedisManager::from_config(&config.redis, &config.cache)
        .await
        .context("failed to initialize distributed cache")?;

    let bind = config.server.bind.clone();
    let state = AppState::new(config, storage, redis);
    let app = create_router(state);

    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
