/**
 * Session Tokens
 *
 * HS256 JWT encoding and validation. Tokens are issued by the external user
 * service; this server only validates them. `create_token` exists so tests
 * and local tooling can mint tokens signed with the same secret.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime: 30 days
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username (optional for backwards compatibility)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    /// Claims for `user_id` valid for `ttl_secs` from now
    pub fn new(user_id: impl Into<String>, username: Option<String>, ttl_secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            sub: user_id.into(),
            username,
            exp: now + ttl_secs,
            iat: now,
        }
    }
}

/// Sign `claims` with `secret`
pub fn encode_claims(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key)
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `secret` - HS256 signing secret
/// * `user_id` - User ID, stored as the subject
/// * `username` - Display name shown to other users
pub fn create_token(
    secret: &str,
    user_id: &str,
    username: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, username.map(str::to_string), DEFAULT_TOKEN_TTL_SECS);
    encode_claims(secret, &claims)
}

/// Verify and decode a JWT token
///
/// Checks the signature and the `exp` claim.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}
