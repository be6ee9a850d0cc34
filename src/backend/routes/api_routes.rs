/**
 * API Route Handlers
 *
 * Plain HTTP endpoints served next to the WebSocket.
 *
 * # Routes
 *
 * - `POST /start-websocket` - Kept for clients that call it before
 *   connecting. The WebSocket listener runs from process startup, so this
 *   only confirms it; calling it any number of times changes nothing.
 * - `GET /health` - Liveness plus the number of open connections
 */

use crate::backend::error::RealtimeError;
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::server::state::AppState;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

/// Response body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub connections: usize,
}

/// Configure API routes
///
/// Adds `POST /start-websocket` and `GET /health` to `router`.
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/start-websocket", post(start_websocket))
        .route("/health", get(health))
}

/// `POST /start-websocket`
pub async fn start_websocket() -> &'static str {
    tracing::debug!("[Realtime] start-websocket called; listener already running");
    "WebSocket server started"
}

/// `GET /health`
pub async fn health(
    State(registry): State<ConnectionRegistry>,
) -> Result<Json<HealthStatus>, RealtimeError> {
    let connections = registry.len().await?;
    Ok(Json(HealthStatus {
        status: "ok",
        connections,
    }))
}
