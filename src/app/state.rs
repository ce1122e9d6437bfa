//! Application state shared across routes and the tick loop

use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::sim::registry::WorldRegistry;
use crate::util::rate_limit::CommandRateLimiter;

use super::status::EngineStatus;

/// Shared application state, constructed once at startup and passed to
/// the router and the tick loop.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<WorldRegistry>,
    pub backend: BackendClient,
    pub status: EngineStatus,
    pub command_limiter: CommandRateLimiter,
    /// Fan-out shutdown signal; the tick loop and the HTTP server both
    /// subscribe
    pub shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let status = EngineStatus::new();
        let backend = BackendClient::new(&config, status.clone());
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            registry: Arc::new(WorldRegistry::new()),
            backend,
            status,
            command_limiter: CommandRateLimiter::new(),
            shutdown,
        }
    }
}
