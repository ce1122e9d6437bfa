//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
/// Every knob has a default so the engine runs out of the box against a
/// backend on localhost:8000.
#[derive(Clone, Debug)]
pub struct Config {
    /// Engine binding address
    pub engine_addr: SocketAddr,
    /// Base URL of the display backend
    pub backend_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Area identifier announced in the world-init payload
    pub area_id: String,

    /// Simulation tick period
    pub tick_interval: Duration,

    /// Steady-state delivery retry budget
    pub max_retries: u32,
    /// Fixed delay between delivery attempts
    pub retry_delay: Duration,
    /// Per-attempt send timeout
    pub send_timeout: Duration,

    /// Bind attempts before startup fails
    pub bind_max_attempts: u32,
    /// Delay between bind attempts
    pub bind_retry_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Deploy targets provide PORT, fall back to ENGINE_ADDR or default
        let engine_addr = if let Ok(port) = env::var("PORT") {
            format!("127.0.0.1:{}", port)
        } else {
            env::var("ENGINE_ADDR").unwrap_or_else(|_| "127.0.0.1:8001".to_string())
        };

        Ok(Self {
            engine_addr: engine_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            area_id: env::var("AREA_ID").unwrap_or_else(|_| "test_area".to_string()),

            tick_interval: Duration::from_millis(parse_env("TICK_INTERVAL_MS", 500)?),

            max_retries: parse_env("MAX_RETRIES", 5)?,
            retry_delay: Duration::from_millis(parse_env("RETRY_DELAY_MS", 2_000)?),
            send_timeout: Duration::from_millis(parse_env("SEND_TIMEOUT_MS", 5_000)?),

            bind_max_attempts: parse_env("BIND_MAX_ATTEMPTS", 10)?,
            bind_retry_delay: Duration::from_millis(parse_env("BIND_RETRY_DELAY_MS", 5_000)?),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid engine address format")]
    InvalidAddress,

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
