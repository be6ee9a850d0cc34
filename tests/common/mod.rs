//! Common test utilities and helpers
//!
//! This module provides shared utilities for the integration tests:
//! - A real server on an ephemeral port
//! - WebSocket client helpers
//! - Token helpers

#![allow(dead_code)]

pub mod auth_helpers;
pub mod test_server;
pub mod ws_client;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use test_server::*;
pub use ws_client::*;
