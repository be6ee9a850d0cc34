//! Social Realtime - Messaging Core
//!
//! The real-time messaging core of a social networking application: it
//! accepts authenticated WebSocket connections, parses inbound envelopes,
//! routes them by type and fans chat messages and notifications out to the
//! right subset of connected peers.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic wire types
//!   - Envelopes, server frames and their codec
//!   - Connection identity
//!   - Decode/encode errors
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum server, configuration and routes
//!   - Credential verification
//!   - Connection registry, lifecycle, router and handlers
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the
//!   `realtime-server` binary. Without it only the wire types build, for
//!   clients that just need the codec.
//!
//! # Usage
//!
//! ```rust,no_run
//! use social_realtime::backend::server::{create_app, RealtimeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RealtimeConfig::load()?;
//! let (app, _state) = create_app(config);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:6001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Wire Format
//!
//! ```text
//! client → server   {"type": "CHAT", "text": "hi"}
//!                   {"type": "NOTIFICATION", "to": ["bob"], "text": "poke"}
//! server → client   {"user": "alice", "text": "hi"}
//!                   {"notification": {"from": "alice", "text": "poke"}}
//!                   {"error": "Unknown message type"}
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
