//! Backend Error Module
//!
//! This module defines error types specific to the realtime server.
//!
//! # Architecture
//!
//! - **`types`** - Error type definitions and constructors
//! - **`conversion`** - Conversions into HTTP responses and error frames
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and error frame conversions
//! ```
//!
//! Errors on an open connection never leave that connection: they become an
//! error frame to the sender (or a log line, for delivery failures) and the
//! read loop continues.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{AuthError, RealtimeError, INVALID_MESSAGE_FORMAT, UNKNOWN_MESSAGE_TYPE};
