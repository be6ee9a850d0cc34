/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Routes
 *
 * 1. `GET {ws_path}` - WebSocket upgrade (default `/websockets`)
 * 2. API routes (`/start-websocket`, `/health`)
 * 3. Fallback handler (404)
 *
 * # Middleware
 *
 * - `TraceLayer` - one span per HTTP request, including upgrades
 * - `CorsLayer` - permissive; the browser client is served from another origin
 */

use crate::backend::realtime::session::ws_upgrade;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Shared state; its config decides the WebSocket path
pub fn create_router(app_state: AppState) -> Router<()> {
    let ws_path = app_state.config.ws_path.clone();

    let router = Router::new().route(&ws_path, get(ws_upgrade));

    // Add API routes
    let router = configure_api_routes(router);

    // Fallback handler for 404
    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::server::config::RealtimeConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = RealtimeConfig::builder().jwt_secret("router-secret").build().unwrap();
        create_router(AppState::new(config))
    }

    #[tokio::test]
    async fn test_health_reports_connections() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ok", "connections": 0}));
    }

    #[tokio::test]
    async fn test_start_websocket_is_idempotent() {
        let app = app();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::post("/start-websocket").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"WebSocket server started");
        }
    }

    #[tokio::test]
    async fn test_upgrade_without_credential_is_unauthorized() {
        let response = app()
            .oneshot(Request::get("/websockets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
