/**
 * Authentication Extractor
 *
 * `VerifiedIdentity` runs the configured `CredentialVerifier` against the
 * request head. Placed before `WebSocketUpgrade` in a handler's arguments,
 * it refuses unauthenticated upgrades with a 401 before any connection
 * exists.
 */

use crate::backend::error::RealtimeError;
use crate::backend::server::state::AppState;
use crate::shared::Identity;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Axum extractor for the identity bound to a verified credential
#[derive(Clone, Debug)]
pub struct VerifiedIdentity(pub Identity);

impl FromRequestParts<AppState> for VerifiedIdentity {
    type Rejection = RealtimeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.verifier.verify(parts).map_err(|e| {
            tracing::warn!(error = %e, path = %parts.uri.path(), "[Auth] Credential rejected");
            RealtimeError::from(e)
        })?;

        tracing::debug!(user = %identity, "[Auth] Credential verified");
        Ok(VerifiedIdentity(identity))
    }
}
