//! Envelope Codec
//!
//! Converts between raw frame bytes and the typed envelopes and frames in
//! [`crate::shared::envelope`].
//!
//! - `decode` / `decode_limited` - client bytes to `Envelope`
//! - `encode_frame` - `ServerFrame` to JSON text
//! - `encode_envelope` / `decode_frame` - the reverse directions, used by
//!   clients and tests
//!
//! Encoding is deterministic: identical input always produces identical
//! bytes (struct fields serialize in declaration order and opaque fields are
//! kept in a sorted map), so `decode(encode_envelope(x)) == x` holds for
//! every well-formed envelope. Floats parse back bit-for-bit (serde_json's
//! `float_roundtrip`).

use crate::shared::envelope::{Envelope, ServerFrame};
use crate::shared::error::{DecodeError, EncodeError};

/// Largest inbound frame accepted when no limit is configured
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Decode a client frame using the default size limit
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    decode_limited(bytes, DEFAULT_MAX_FRAME_BYTES)
}

/// Decode a client frame, rejecting frames larger than `limit` bytes
pub fn decode_limited(bytes: &[u8], limit: usize) -> Result<Envelope, DecodeError> {
    if bytes.len() > limit {
        return Err(DecodeError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }

    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidEncoding)?;
    let value: serde_json::Value = serde_json::from_str(text)?;
    Envelope::from_value(value)
}

/// Encode an envelope the way a client would put it on the wire
pub fn encode_envelope(envelope: &Envelope) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&envelope.to_value())?)
}

/// Encode a server-to-client frame
pub fn encode_frame(frame: &ServerFrame) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decode a server-to-client frame
pub fn decode_frame(bytes: &[u8]) -> Result<ServerFrame, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidEncoding)?;
    Ok(serde_json::from_str(text)?)
}
