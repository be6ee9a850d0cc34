//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and any Rust client of the realtime endpoint. These types are
//! used for serialization and communication over the WebSocket wire format.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code:
//!
//! - **`envelope`** - Inbound envelopes and outbound server frames
//! - **`codec`** - Byte-level decode/encode of envelopes and frames
//! - **`identity`** - The principal bound to a connection
//! - **`error`** - Decode and encode errors

/// Envelope and frame types
pub mod envelope;

/// Envelope codec
pub mod codec;

/// Connection identity
pub mod identity;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use envelope::{
    ChatPayload, Envelope, MessageType, NotificationBody, NotificationPayload, Payload,
    Recipients, ServerFrame,
};
pub use error::{DecodeError, EncodeError};
pub use identity::Identity;
