//! Token claim models.
//!
//! These are the exact serialized shapes of the JWT payloads; service-facing
//! API models live with the service that owns them.

use serde::{Deserialize, Serialize};

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject — issuer-space user ID rendered as a string.
    pub sub: String,
    /// User email.
    pub email: String,
    /// User display name.
    pub name: String,
    /// Issuing authority.
    pub iss: String,
    /// Audience, always `user-access`.
    pub aud: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// JWT claims embedded in refresh tokens.
///
/// Deliberately minimal: profile fields are re-read from storage at renewal
/// time rather than trusted from a week-old token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject — issuer-space user ID rendered as a string.
    pub sub: String,
    /// Issuing authority.
    pub iss: String,
    /// Audience, always `user-refresh`.
    pub aud: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}
