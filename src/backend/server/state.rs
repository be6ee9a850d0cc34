/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container, holding:
 * - The connection registry handle
 * - The lifecycle manager (accept, open, close, shutdown)
 * - The message router and its handler table
 * - The credential verifier
 * - The validated configuration
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and safe to share. The registry is a handle
 * to a single-owner task; the router, verifier and config are immutable
 * after startup and shared through `Arc`.
 */

use crate::backend::auth::{CredentialVerifier, JwtVerifier};
use crate::backend::realtime::lifecycle::LifecycleManager;
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::realtime::router::MessageRouter;
use crate::backend::server::config::RealtimeConfig;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state shared by every request handler and connection task
#[derive(Clone)]
pub struct AppState {
    /// Handle to the registry of open connections
    pub registry: ConnectionRegistry,

    /// Owns every connection state transition
    pub lifecycle: LifecycleManager,

    /// Type-to-handler dispatch table
    pub router: Arc<MessageRouter>,

    /// Checks upgrade request credentials
    pub verifier: Arc<dyn CredentialVerifier>,

    pub config: Arc<RealtimeConfig>,
}

impl AppState {
    /// Build the state for `config` with the JWT verifier and default handlers
    ///
    /// Spawns the registry task, so it must run inside a tokio runtime.
    pub fn new(config: RealtimeConfig) -> Self {
        let registry = ConnectionRegistry::spawn();
        let lifecycle = LifecycleManager::new(registry.clone(), config.outbound_queue_capacity);
        let verifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));

        Self {
            registry,
            lifecycle,
            router: Arc::new(MessageRouter::with_defaults()),
            verifier,
            config: Arc::new(config),
        }
    }

    /// Replace the handler table
    pub fn with_router(mut self, router: MessageRouter) -> Self {
        self.router = Arc::new(router);
        self
    }

    /// Replace the credential verifier
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}

impl FromRef<AppState> for ConnectionRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for LifecycleManager {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.lifecycle.clone()
    }
}

impl FromRef<AppState> for Arc<RealtimeConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
