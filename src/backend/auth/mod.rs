//! Authentication Module
//!
//! This module verifies the credentials presented on WebSocket upgrade
//! requests. Token issuance (signup, login) belongs to the external user
//! service; this server only checks signatures and expiry.
//!
//! # Architecture
//!
//! - **`sessions`** - JWT claims, encoding and validation
//! - **`verifier`** - `CredentialVerifier` trait and the JWT implementation
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── sessions.rs     - JWT token management
//! └── verifier.rs     - Upgrade request credential verification
//! ```
//!
//! # Security
//!
//! - Invalid or expired credentials return 401 (no information leakage)
//! - No connection is created or registered for a refused credential

/// JWT token generation and validation
pub mod sessions;

/// Credential verification for upgrade requests
pub mod verifier;

pub use sessions::{create_token, verify_token, Claims};
pub use verifier::{extract_credential, CredentialVerifier, JwtVerifier};
