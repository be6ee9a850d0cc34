//! Shared Error Types
//!
//! This module defines the errors produced while turning raw frames into
//! envelopes. They are platform-agnostic: a client decoding server frames and
//! the server decoding client frames hit the same failures.
//!
//! # Error Categories
//!
//! - `TooLarge` - The frame exceeds the configured size limit
//! - `InvalidEncoding` - The frame is not UTF-8
//! - `Malformed` - The frame is not a JSON object
//! - `MissingType` - The `type` field is absent or not a string
//! - `InvalidField` - A field required by the declared type is missing or mistyped
//!
//! `EncodeError` covers the reverse direction and only wraps serializer
//! failures.
//!
//! # Usage
//!
//! ```rust
//! use social_realtime::shared::error::DecodeError;
//!
//! let error = DecodeError::invalid_field("CHAT", "text", "expected a string");
//! assert!(error.to_string().contains("text"));
//! ```
use thiserror::Error;

/// Failure to decode an inbound frame into an envelope
///
/// A decode failure is never fatal to the connection that produced it; the
/// caller answers with an error frame and keeps reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is larger than the accepted limit
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Size of the rejected frame
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Frame bytes are not valid UTF-8
    #[error("frame is not valid UTF-8")]
    InvalidEncoding,

    /// Frame is not a JSON object
    #[error("malformed envelope: {message}")]
    Malformed {
        /// Parser detail
        message: String,
    },

    /// Envelope has no string `type` field
    #[error("envelope is missing a string 'type' field")]
    MissingType,

    /// A field required by the declared type is missing or has the wrong shape
    #[error("invalid field '{field}' for {kind} envelope: {message}")]
    InvalidField {
        /// Declared envelope type
        kind: String,
        /// Offending field
        field: String,
        /// Human-readable detail
        message: String,
    },
}

impl DecodeError {
    /// Create a new malformed-envelope error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a new invalid-field error
    pub fn invalid_field(
        kind: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            kind: kind.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to serialize an outbound frame
#[derive(Debug, Error)]
#[error("failed to encode frame: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
