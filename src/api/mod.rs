// HTTP and WebSocket APIs for observers

pub mod devices;
pub mod websocket;

pub use devices::{create_devices_router, DevicesAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::config::ServerConfig;
use crate::controller::Controller;
use axum::http::HeaderValue;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Full observer-facing router with CORS applied
pub fn create_app(controller: Arc<Controller>, server: &ServerConfig) -> Router {
    let ws_state = Arc::new(WsAppState {
        controller: Arc::clone(&controller),
    });
    let devices_state = Arc::new(DevicesAppState { controller });

    create_ws_router(ws_state)
        .merge(create_devices_router(devices_state))
        .layer(cors_layer(&server.cors_allowed_origins))
}

/// Empty allow-list means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
