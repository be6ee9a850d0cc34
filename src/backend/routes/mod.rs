//! Route Configuration Module
//!
//! This module configures all HTTP routes for the realtime server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation, WebSocket route and middleware
//! - **`api_routes`** - Plain HTTP endpoints (`/start-websocket`, `/health`)
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - API endpoint handlers
//! ```

pub mod api_routes;
pub mod router;

pub use router::create_router;
