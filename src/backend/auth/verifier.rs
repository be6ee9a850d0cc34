/**
 * Credential Verifier
 *
 * Turns the credential on an upgrade request into an `Identity`, or refuses
 * it. Runs exactly once per connection attempt, before the WebSocket
 * handshake completes.
 *
 * # Credential Sources
 *
 * 1. `Authorization: Bearer <token>` header
 * 2. `token` query parameter (browsers cannot set headers on a WebSocket
 *    upgrade)
 *
 * A present but malformed `Authorization` header is rejected outright rather
 * than falling back to the query string.
 */

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::AuthError;
use crate::shared::Identity;
use axum::extract::Query;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use serde::Deserialize;

/// Validates the credential carried by an upgrade request
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, parts: &Parts) -> Result<Identity, AuthError>;
}

/// HS256 JWT verifier
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify a raw token
    pub fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = verify_token(&self.secret, token).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        let display_name = claims
            .username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| claims.sub.clone());
        Ok(Identity::new(claims.sub, display_name))
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, parts: &Parts) -> Result<Identity, AuthError> {
        let token = extract_credential(parts)?;
        self.verify_token(&token)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull the bearer token out of the header or the query string
pub fn extract_credential(parts: &Parts) -> Result<String, AuthError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedHeader)?;
        return Ok(token.to_string());
    }

    let Ok(Query(query)) = Query::<TokenQuery>::try_from_uri(&parts.uri) else {
        return Err(AuthError::MissingCredential);
    };
    query
        .token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::sessions::{create_token, encode_claims, Claims};
    use assert_matches::assert_matches;
    use axum::http::Request;

    const SECRET: &str = "test-secret";

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_header() {
        let token = create_token(SECRET, "u1", Some("alice")).unwrap();
        let parts = parts("/websockets", Some(&format!("Bearer {token}")));

        let identity = JwtVerifier::new(SECRET).verify(&parts).unwrap();
        assert_eq!(identity, Identity::new("u1", "alice"));
    }

    #[test]
    fn test_query_token() {
        let token = create_token(SECRET, "u1", Some("alice")).unwrap();
        let parts = parts(&format!("/websockets?token={token}"), None);

        let identity = JwtVerifier::new(SECRET).verify(&parts).unwrap();
        assert_eq!(identity.display_name, "alice");
    }

    #[test]
    fn test_display_name_falls_back_to_subject() {
        let token = create_token(SECRET, "u1", None).unwrap();
        let identity = JwtVerifier::new(SECRET).verify_token(&token).unwrap();
        assert_eq!(identity, Identity::new("u1", "u1"));
    }

    #[test]
    fn test_missing_credential() {
        let verifier = JwtVerifier::new(SECRET);
        assert_eq!(
            verifier.verify(&parts("/websockets", None)),
            Err(AuthError::MissingCredential)
        );
        assert_eq!(
            verifier.verify(&parts("/websockets?token=", None)),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn test_malformed_header_does_not_fall_back() {
        let token = create_token(SECRET, "u1", None).unwrap();
        let parts = parts(&format!("/websockets?token={token}"), Some("Basic abc"));
        assert_eq!(
            JwtVerifier::new(SECRET).verify(&parts),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token("other", "u1", None).unwrap();
        assert_matches!(
            JwtVerifier::new(SECRET).verify_token(&token),
            Err(AuthError::InvalidToken(_))
        );
    }

    #[test]
    fn test_expired_token() {
        let mut claims = Claims::new("u1", None, 0);
        claims.exp = claims.iat.saturating_sub(3600);
        let token = encode_claims(SECRET, &claims).unwrap();
        assert_eq!(
            JwtVerifier::new(SECRET).verify_token(&token),
            Err(AuthError::Expired)
        );
    }
}
