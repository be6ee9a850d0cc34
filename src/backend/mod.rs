//! Backend Module
//!
//! This module contains all server-side code for the realtime messaging
//! core: an Axum server that accepts authenticated WebSocket connections and
//! routes chat and notification envelopes between them.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Connections, registry, routing, handlers, sessions
//! - **`auth`** - JWT validation and the credential verifier
//! - **`middleware`** - The `VerifiedIdentity` extractor
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - `realtime-server` binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - Messaging core
//! ├── auth/           - Credential verification
//! ├── middleware/     - Request extractors
//! └── error/          - Error types
//! ```
//!
//! # Endpoints
//!
//! - `GET /websockets` - WebSocket upgrade (`Authorization: Bearer` or `?token=`)
//! - `POST /start-websocket` - Compatibility no-op
//! - `GET /health` - Liveness and open connection count

pub mod auth;
pub mod error;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;
