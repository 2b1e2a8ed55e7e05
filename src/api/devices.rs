use crate::controller::Controller;
use crate::interpreter::Directive;
use crate::state::{DeviceSnapshot, DeviceView, MetricsSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for the device HTTP API
pub struct DevicesAppState {
    pub controller: Arc<Controller>,
}

#[derive(Serialize)]
pub struct DevicesResponse {
    pub devices: DeviceSnapshot,
}

#[derive(Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub understood: bool,
    pub directives: Vec<Directive>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Create device API router
pub fn create_devices_router(state: Arc<DevicesAppState>) -> Router {
    Router::new()
        .route("/api/devices", get(list_devices))
        .route("/api/devices/:id", get(get_device))
        .route("/api/commands", post(submit_command))
        .route("/api/metrics", get(get_metrics))
        .with_state(state)
}

/// GET /api/devices - snapshot of every device
async fn list_devices(State(state): State<Arc<DevicesAppState>>) -> Json<DevicesResponse> {
    Json(DevicesResponse {
        devices: state.controller.store().get_all(),
    })
}

/// GET /api/devices/:id
async fn get_device(
    State(state): State<Arc<DevicesAppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceView>, Response> {
    state
        .controller
        .store()
        .get(&id)
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, &format!("unknown device '{}'", id)))
}

/// POST /api/commands - same path as an observer's text command.
///
/// 202 because commands are fire-and-forget; the resulting state change
/// arrives later through the status channel.
async fn submit_command(
    State(state): State<Arc<DevicesAppState>>,
    Json(request): Json<CommandRequest>,
) -> Response {
    let text = match request.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return error(StatusCode::BAD_REQUEST, "text is required"),
    };

    let directives = state.controller.handle_text_command(&text).await;
    (
        StatusCode::ACCEPTED,
        Json(CommandResponse {
            understood: !directives.is_empty(),
            directives,
        }),
    )
        .into_response()
}

/// GET /api/metrics - bridge counters
async fn get_metrics(State(state): State<Arc<DevicesAppState>>) -> Json<MetricsSnapshot> {
    Json(state.controller.store().metrics.snapshot())
}
