//! Page Cache - A network-accessible page cache
//!
//! Stores opaque page content under a url with per-page TTL, access-frequency
//! ranking and a byte budget enforced by least-frequent eviction.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use page_cache::api::create_router;
use page_cache::config::StoreBackend;
use page_cache::store::{MemoryStore, PageStore, RedisStore};
use page_cache::{spawn_sweep_task, AppState, Config};

/// Main entry point for the page cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the backing store (a failed Redis ping aborts startup)
/// 4. Start background expiry sweep task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "page_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Page Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, capacity={}B, default_ttl={}s, port={}, sweep_interval={}s",
        config.backend,
        config.capacity_bytes,
        config.default_ttl,
        config.server_port,
        config.sweep_interval
    );

    match config.backend {
        StoreBackend::Memory => serve(MemoryStore::new(), config).await,
        StoreBackend::Redis => {
            let store = RedisStore::connect(
                &config.redis_host,
                config.redis_port,
                config.redis_key_prefix.clone(),
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to Redis at {}:{}",
                    config.redis_host, config.redis_port
                )
            })?;
            serve(store, config).await
        }
    }
}

/// Runs the HTTP server over an already connected store until shutdown.
async fn serve<S: PageStore>(store: S, config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(store, &config);
    info!("Cache engine initialized");

    let sweep_handle = spawn_sweep_task(Arc::clone(&state.engine), config.sweep_interval);
    info!("Background expiry sweep started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
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
                warn!("Failed to install SIGTERM handler: {}", err);
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

    sweep_handle.abort();
    warn!("Expiry sweep task aborted");
}
