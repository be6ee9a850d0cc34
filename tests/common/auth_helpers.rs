//! Authentication test helpers
//!
//! Mints tokens signed with the test server's secret.

use social_realtime::backend::auth::sessions::{create_token, encode_claims, Claims};

/// Secret every test server is configured with
pub const TEST_SECRET: &str = "integration-test-secret";

/// Token for `username`, with the user id `id-<username>`
pub fn token_for(username: &str) -> String {
    create_token(TEST_SECRET, &format!("id-{username}"), Some(username))
        .expect("Failed to create test token")
}

/// Token that expired an hour ago
pub fn expired_token(username: &str) -> String {
    let mut claims = Claims::new(format!("id-{username}"), Some(username.to_string()), 0);
    claims.exp = claims.iat.saturating_sub(3600);
    encode_claims(TEST_SECRET, &claims).expect("Failed to create expired token")
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
