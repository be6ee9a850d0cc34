/**
 * Server Initialization
 *
 * This module builds the application state and the router, and runs the
 * server until shutdown.
 *
 * # Initialization Process
 *
 * 1. Spawn the connection registry and build `AppState`
 * 2. Create the router for the configured WebSocket path
 * 3. Bind the listener once, at startup
 *
 * # Shutdown
 *
 * When the shutdown signal fires, the lifecycle manager closes every open
 * connection with `1001 going away` before axum finishes draining.
 */

use crate::backend::error::RealtimeError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::RealtimeConfig;
use crate::backend::server::state::AppState;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

/// Create and configure the Axum application
///
/// Returns the router and the state behind it, so callers can reach the
/// registry and lifecycle manager (for shutdown and in tests).
pub fn create_app(config: RealtimeConfig) -> (Router<()>, AppState) {
    tracing::info!(ws_path = %config.ws_path, "Initializing realtime server");

    let state = AppState::new(config);
    let app = create_router(state.clone());

    tracing::info!("Router configured");
    (app, state)
}

/// Serve `app` on `listener` until `signal` resolves, then close every
/// connection
pub async fn serve<F>(
    listener: TcpListener,
    app: Router<()>,
    state: AppState,
    signal: F,
) -> Result<(), RealtimeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let lifecycle = state.lifecycle.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("Shutdown signal received");
            lifecycle.shutdown().await;
        })
        .await
        .map_err(|e| RealtimeError::fault(format!("server error: {e}")))
}
