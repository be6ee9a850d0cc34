//! Middleware Module
//!
//! Request processing that runs before handlers.
//!
//! - **`auth`** - `VerifiedIdentity` extractor guarding the WebSocket upgrade

pub mod auth;

pub use auth::VerifiedIdentity;
