//! HTTP client for the display backend
//!
//! Two delivery policies share one client: steady-state events use a
//! bounded retry with a fixed delay, world init polls indefinitely because
//! the simulation cannot start without the backend.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::status::EngineStatus;
use crate::config::Config;

use super::retry::{ErrorClass, RetryPolicy};

/// Delivery failures surfaced to the tick loop and startup path
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),
}

impl DeliveryError {
    pub fn class(&self) -> ErrorClass {
        match self {
            // Connect failures, timeouts, dropped sockets
            DeliveryError::Request(_) => ErrorClass::Transient,
            // A garbled body may be a backend mid-restart
            DeliveryError::Parse(_) => ErrorClass::Transient,
            DeliveryError::Api { status, .. } if *status >= 500 => ErrorClass::Transient,
            DeliveryError::Api { .. } => ErrorClass::Permanent,
        }
    }
}

/// Client for pushing events and configuration to the backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
    status: EngineStatus,
}

impl BackendClient {
    pub fn new(config: &Config, status: EngineStatus) -> Self {
        Self {
            client: Client::new(),
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            timeout: config.send_timeout,
            policy: RetryPolicy::new(config.max_retries, config.retry_delay),
            status,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// One POST attempt with the per-attempt timeout
    async fn post_once(&self, endpoint: &str, payload: &Value) -> Result<Value, DeliveryError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(DeliveryError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(DeliveryError::Parse)
    }

    /// Deliver with the bounded steady-state policy.
    ///
    /// On exhaustion the last error is recorded as the current engine
    /// status and returned; the caller decides whether that is fatal.
    pub async fn deliver(&self, endpoint: &str, payload: &Value) -> Result<Value, DeliveryError> {
        let delivery_id = Uuid::new_v4();
        let mut attempt = 1u32;

        loop {
            match self.post_once(endpoint, payload).await {
                Ok(body) => {
                    info!(%delivery_id, endpoint, attempt, "delivered to backend");
                    return Ok(body);
                }
                Err(err) => match self.policy.next_delay(attempt, err.class()) {
                    Some(delay) => {
                        warn!(
                            %delivery_id,
                            endpoint,
                            attempt,
                            error = %err,
                            "delivery attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        error!(%delivery_id, endpoint, attempt, error = %err, "delivery failed");
                        self.status
                            .set_error(format!("Failed to communicate with backend: {err}"));
                        return Err(err);
                    }
                },
            }
        }
    }

    /// Deliver with unbounded wait-and-retry. Used only for the mandatory
    /// world-init push; returns the backend's response once it is up.
    pub async fn deliver_until_ready(&self, endpoint: &str, payload: &Value) -> Value {
        let delivery_id = Uuid::new_v4();
        let mut attempt = 1u64;

        loop {
            match self.post_once(endpoint, payload).await {
                Ok(body) => {
                    info!(%delivery_id, endpoint, attempt, "delivered to backend");
                    return body;
                }
                Err(err) => {
                    warn!(%delivery_id, endpoint, attempt, error = %err, "backend not ready");
                    self.status.set_error("Waiting for backend to start...");
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn test_config(backend_url: String, max_retries: u32) -> Config {
        Config {
            engine_addr: "127.0.0.1:0".parse().unwrap(),
            backend_url,
            log_level: "warn".to_string(),
            area_id: "test_area".to_string(),
            tick_interval: Duration::from_millis(500),
            max_retries,
            retry_delay: Duration::from_millis(10),
            send_timeout: Duration::from_millis(500),
            bind_max_attempts: 1,
            bind_retry_delay: Duration::ZERO,
        }
    }

    /// Accepts connections and drops them immediately, counting attempts
    async fn hostile_backend() -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        tokio::spawn(async move {
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    drop(socket);
                }
            }
        });
        (addr, attempts)
    }

    #[tokio::test]
    async fn deliver_exhausts_retry_budget_and_reports() {
        let (addr, attempts) = hostile_backend().await;
        let status = EngineStatus::new();
        let client = BackendClient::new(&test_config(format!("http://{addr}"), 3), status.clone());

        let result = client
            .deliver("event", &serde_json::json!({"event": "woke_up"}))
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        let entry = status.last_error().expect("failure recorded in status");
        assert!(entry.message.contains("Failed to communicate with backend"));
    }

    #[tokio::test]
    async fn deliver_fails_fast_against_closed_port() {
        // Bind-then-drop yields a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let status = EngineStatus::new();
        let client = BackendClient::new(&test_config(format!("http://{addr}"), 2), status);

        let err = client
            .deliver("command", &serde_json::json!({"command": "move_to"}))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn api_errors_classify_by_status() {
        let server_side = DeliveryError::Api {
            status: 503,
            body: String::new(),
        };
        assert_eq!(server_side.class(), ErrorClass::Transient);

        let client_side = DeliveryError::Api {
            status: 400,
            body: "bad payload".to_string(),
        };
        assert_eq!(client_side.class(), ErrorClass::Permanent);
    }
}
