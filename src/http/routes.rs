//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::app::AppState;
use crate::backend::protocol::{CommandRequest, House, Store};
use crate::sim::command::{apply_command, CommandError};
use crate::sim::registry::EntityView;
use crate::util::time::{epoch_secs, uptime_secs};

/// How long the last command stays on the status surface
const COMMAND_DISPLAY_WINDOW: f64 = 5.0;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/command", post(command_handler))
        .route("/shutdown", post(shutdown_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(10))),
        )
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    entity_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        entity_count: state.registry.entity_count(),
        last_error: state.status.last_error().map(|entry| entry.message),
    })
}

// ============================================================================
// Status endpoint (operator view of the whole simulation)
// ============================================================================

#[derive(Serialize)]
struct StatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    last_command: Option<CommandRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    entities: Vec<EntityView>,
    houses: Vec<House>,
    stores: Vec<Store>,
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let now = epoch_secs();
    Json(StatusResponse {
        last_command: state
            .registry
            .last_command(now, COMMAND_DISPLAY_WINDOW)
            .map(|recorded| recorded.command),
        error: state.status.recent_error(now).map(|entry| entry.message),
        entities: state.registry.entity_views(now),
        houses: state.registry.houses(),
        stores: state.registry.stores(),
    })
}

// ============================================================================
// Command endpoint
// ============================================================================

#[derive(Serialize)]
struct CommandResponse {
    status: &'static str,
    message: &'static str,
    entity_state: EntityView,
}

async fn command_handler(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, AppError> {
    if !state.command_limiter.check() {
        return Err(AppError::TooManyRequests);
    }

    info!(
        command = %request.command,
        entity_id = %request.entity_id,
        "received command from backend"
    );

    let view = apply_command(&state.registry, &request, epoch_secs()).map_err(|err| {
        state.status.set_error(format!(
            "Error processing command {}: {}",
            request.command, err
        ));
        AppError::from(err)
    })?;

    Ok(Json(CommandResponse {
        status: "success",
        message: "Command processed",
        entity_state: view,
    }))
}

// ============================================================================
// Shutdown endpoint
// ============================================================================

#[derive(Serialize)]
struct ShutdownResponse {
    status: &'static str,
    message: &'static str,
}

async fn shutdown_handler(State(state): State<AppState>) -> Json<ShutdownResponse> {
    info!("received shutdown command from backend");
    let _ = state.shutdown.send(true);

    Json(ShutdownResponse {
        status: "success",
        message: "Shutdown initiated",
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    TooManyRequests,
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::UnknownEntity(_) => AppError::NotFound(err.to_string()),
            CommandError::UnknownCommand(_)
            | CommandError::MissingDestination(_)
            | CommandError::MissingTarget => AppError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many commands".to_string(),
            ),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
