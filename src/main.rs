//! Tiered Cache - admin server
//!
//! Hosts a cache manager built from environment configuration and exposes
//! the admin API over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::api::{
    create_router, create_router_with_response_cache, AppState, ResponseCacheState, RESPONSE_STORE,
};
use tiered_cache::{CacheManager, Config, StoreConfig};

const RESPONSE_STORE_CAPACITY: usize = 64;

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager (default store, sweeper, write-behind drain)
/// 4. Create Axum router with all endpoints, caching `/stats` responses
///    unless `RESPONSE_CACHE_TTL_MS=none`
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM stop the timed drain, flush the write-behind queue
///    and tear down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiered cache server");

    let config = Config::from_env();
    info!(
        capacity = config.default_store.capacity,
        default_ttl_ms = config.default_store.default_ttl.map(|t| t.as_millis() as u64),
        port = config.server_port,
        batch_size = config.write_behind.batch_size,
        max_retries = config.write_behind.max_retries,
        "Configuration loaded"
    );

    let manager = Arc::new(CacheManager::from_config(&config)?);
    let state = AppState::new(manager.clone());
    let app = match config.response_cache_ttl {
        Some(ttl) => {
            manager.create_cache(RESPONSE_STORE, StoreConfig::new(RESPONSE_STORE_CAPACITY))?;
            info!(ttl_ms = ttl.as_millis() as u64, "response cache enabled for /stats");
            create_router_with_response_cache(
                state,
                ResponseCacheState::new(manager.clone(), RESPONSE_STORE, ttl),
            )
        }
        None => create_router(state),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let report = manager.shutdown().await;
    if report.abandoned > 0 {
        error!(abandoned = report.abandoned, "write-behind updates lost during shutdown");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
