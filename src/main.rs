//! Shardcache - A sharded in-memory key-value cache server
//!
//! Partitions keys across independently locked LRU shards and serves a
//! line-oriented command protocol through a bounded worker pool.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shardcache::{serve, spawn_dispatcher, Config, ServerState};

/// Main entry point for the Shardcache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the sharded store and shared server state
/// 4. Spawn the worker pool dispatcher
/// 5. Accept TCP connections on the configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shardcache Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: shard_count={}, shard_capacity={}, worker_count={}, port={}, auth={}",
        config.shard_count,
        config.shard_capacity,
        config.worker_count,
        config.server_port,
        config.auth_password.is_some()
    );

    // Create the shared store and handler state
    let state = ServerState::from_config(&config);
    info!("Sharded store initialized");

    // Spawn the worker pool
    let dispatcher = spawn_dispatcher(&state, config.worker_count);
    info!("Worker pool started with {} workers", config.worker_count);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    info!("Server listening on {}", addr);

    // Accept connections until a shutdown signal arrives, then drain
    serve(listener, dispatcher, shutdown_signal()).await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
