//! Game Engine - entity simulation server
//!
//! This is the main entry point for the game engine. It handles:
//! - World initialization pushed to the display backend
//! - The fixed-interval simulation tick loop
//! - HTTP endpoints for operator commands, status, and shutdown
//! - Retrying event delivery to the backend

mod app;
mod backend;
mod config;
mod http;
mod sim;
mod util;
mod world;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;
use crate::sim::TickLoop;
use crate::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Game Engine");
    info!("Engine address: {}", config.engine_addr);
    info!("Backend URL: {}", config.backend_url);

    // Create application state
    let state = AppState::new(config.clone());

    // Grab the port before the world init wait so a second engine instance
    // fails fast instead of polling the backend forever
    let listener = bind_with_retry(&config).await?;

    // The backend must receive the world before the first tick
    world::initialize(&state).await;

    // Spawn the simulation tick loop
    let tick_handle = tokio::spawn(TickLoop::new(&state).run());

    // Build router
    let router = build_router(state.clone());

    info!("Engine listening on {}", config.engine_addr);
    info!("Health check: http://{}/health", config.engine_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.shutdown.clone()))
        .await?;

    // Let the tick loop drain in-flight deliveries before exit
    let _ = state.shutdown.send(true);
    let _ = tick_handle.await;

    info!("Game engine shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Bind the engine port, retrying while another instance drains
async fn bind_with_retry(config: &Config) -> anyhow::Result<TcpListener> {
    let mut attempt = 1u32;
    loop {
        match TcpListener::bind(config.engine_addr).await {
            Ok(listener) => return Ok(listener),
            Err(err) if attempt < config.bind_max_attempts => {
                warn!(%err, attempt, addr = %config.engine_addr, "port unavailable, retrying");
                tokio::time::sleep(config.bind_retry_delay).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(anyhow!(
                    "could not bind {} after {} attempts: {}",
                    config.engine_addr,
                    attempt,
                    err
                ))
            }
        }
    }
}

/// Graceful shutdown: Ctrl+C, SIGTERM, or the `/shutdown` endpoint
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    let mut requested = shutdown.subscribe();

    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
        _ = requested.changed() => {
            info!("Shutdown requested over HTTP, starting graceful shutdown");
        }
    }

    // Make sure every subscriber (tick loop included) sees the signal
    let _ = shutdown.send(true);
}
