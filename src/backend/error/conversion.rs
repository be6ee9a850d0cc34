/**
 * Error Conversion
 *
 * This module converts backend errors into the two shapes a client can see:
 * an HTTP response (for failures before the upgrade completes) and an error
 * frame (for failures on an open connection).
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Unauthenticated",
 *   "status": 401
 * }
 * ```
 *
 * # Frame Format
 *
 * ```json
 * { "error": "Unknown message type" }
 * ```
 */

use crate::backend::error::types::RealtimeError;
use crate::shared::ServerFrame;
use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for RealtimeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Body::from("Internal Server Error"));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

impl From<&RealtimeError> for ServerFrame {
    fn from(error: &RealtimeError) -> Self {
        ServerFrame::error(error.message())
    }
}
