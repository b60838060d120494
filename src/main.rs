//! HMAC Cache - an age-expiring key cache server
//!
//! Serves the cache over HTTP and prunes expired entries in the background.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hmac_cache::api::{create_router, AppState};
use hmac_cache::{spawn_prune_task, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the storage backend and build the cache
/// 4. Start background prune task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM, pruning once more on exit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hmac_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HMAC Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={}, max_age={}s, on_duplicate={}, port={}, prune_interval={}s",
        config.backend, config.max_age, config.on_duplicate, config.server_port, config.prune_interval
    );

    let state = AppState::from_config(&config).context("failed to open cache storage")?;
    info!("Cache initialized");

    let prune_handle = spawn_prune_task(state.cache.clone(), config.prune_interval);
    info!("Background prune task started");

    let cache = state.cache.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(prune_handle))
        .await
        .context("server error")?;

    // Final prune on the way out; failures are logged inside
    if let Err(e) = cache.release().await {
        warn!("Final prune did not complete: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the prune task and allows graceful shutdown.
async fn shutdown_signal(prune_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    prune_handle.abort();
    warn!("Prune task aborted");
}
