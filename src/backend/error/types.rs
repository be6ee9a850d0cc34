/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the realtime messaging core.
 *
 * # Error Categories
 *
 * ## Upgrade-time errors
 *
 * - `Unauthenticated` - The credential on the upgrade request was missing or
 *   invalid; the connection is refused and never created.
 *
 * ## Per-frame errors
 *
 * These are answered with an error frame on the offending connection only;
 * the connection stays open:
 * - `Decode` - The frame is not a well-formed envelope
 * - `UnknownMessageType` - The envelope type has no registered handler
 * - `Handler` - A handler rejected the envelope
 *
 * ## Connection and process errors
 *
 * - `ConnectionFault` - The underlying channel failed; triggers close
 * - `Registry` - The connection registry is no longer running
 * - `Encode` - An outbound frame could not be serialized
 * - `Config` - Startup configuration is invalid
 *
 * Per-recipient delivery failures are not here: they are recorded
 * in a `DeliveryReport` and never propagate.
 */

use crate::backend::realtime::registry::RegistryError;
use crate::backend::server::config::ConfigError;
use crate::shared::{DecodeError, EncodeError};
use axum::http::StatusCode;
use thiserror::Error;

/// Error frame text for frames that fail to decode
pub const INVALID_MESSAGE_FORMAT: &str = "Invalid message format";

/// Error frame text for envelopes nobody handles
pub const UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";

/// Credential verification failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential in the header or the query string
    #[error("missing credential")]
    MissingCredential,

    /// `Authorization` header present but not `Bearer <token>`
    #[error("malformed authorization header")]
    MalformedHeader,

    /// Token signature was valid but it has expired
    #[error("token expired")]
    Expired,

    /// Token failed validation
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Realtime backend error types
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Credential verification failed at upgrade time
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    /// Inbound frame could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Envelope type has no registered handler
    #[error("Unknown message type: {kind}")]
    UnknownMessageType {
        /// Declared type of the rejected envelope
        kind: String,
    },

    /// A handler rejected a decoded envelope
    #[error("Handler error: {message}")]
    Handler {
        /// Human-readable error message
        message: String,
    },

    /// Underlying channel error
    #[error("Connection fault: {message}")]
    ConnectionFault {
        /// Human-readable error message
        message: String,
    },

    /// Connection registry unavailable
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Outbound frame serialization failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RealtimeError {
    pub fn unknown_type(kind: impl Into<String>) -> Self {
        Self::UnknownMessageType { kind: kind.into() }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::ConnectionFault {
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Unauthenticated` - 401 Unauthorized
    /// - `Decode`, `UnknownMessageType`, `Handler` - 400 Bad Request
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Decode(_) | Self::UnknownMessageType { .. } | Self::Handler { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::ConnectionFault { .. }
            | Self::Registry(_)
            | Self::Encode(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    ///
    /// Decode details stay in the server log; the client only learns that
    /// the format was wrong.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated(_) => "Unauthenticated".to_string(),
            Self::Decode(_) => INVALID_MESSAGE_FORMAT.to_string(),
            Self::UnknownMessageType { .. } => UNKNOWN_MESSAGE_TYPE.to_string(),
            Self::Handler { message } => message.clone(),
            Self::ConnectionFault { .. } | Self::Registry(_) | Self::Encode(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }
}
