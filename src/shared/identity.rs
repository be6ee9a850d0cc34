/**
 * Connection Identity
 *
 * The authenticated principal bound to a connection at handshake time.
 * The messaging core treats it as opaque beyond its user id and display
 * name; everything else about the user lives with the external user
 * service.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated principal bound to a connection
///
/// Produced once by the credential verifier and never mutated afterwards.
/// Sender attribution on outbound frames always comes from here, never from
/// client-supplied payload fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id (token subject)
    pub user_id: String,
    /// Name shown to other users
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    /// True when `name` refers to this principal, by display name or user id
    pub fn answers_to(&self, name: &str) -> bool {
        self.display_name == name || self.user_id == name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}
