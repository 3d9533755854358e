//! JWT minting and verification for access and refresh tokens.
//!
//! Both token kinds are HS256, signed with one shared secret, and carry an
//! `iss` claim plus an audience claim that separates them: an access token
//! never verifies as a refresh token or vice versa.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims};

/// Audience claim carried by access tokens.
pub const ACCESS_TOKEN_AUDIENCE: &str = "user-access";
/// Audience claim carried by refresh tokens.
pub const REFRESH_TOKEN_AUDIENCE: &str = "user-refresh";

/// Access token lifetime: 2 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 2 * 60;
/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;
/// A refresh token is reissued only inside the last 24h of its life.
pub const REFRESH_RENEWAL_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Generate a signed access token (HS256, 2 min expiry).
///
/// `subject` is the issuer-space user ID rendered as a string.
pub fn generate_access_token(
    subject: &str,
    email: &str,
    name: &str,
    issuer: &str,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: subject.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        iss: issuer.to_string(),
        aud: ACCESS_TOKEN_AUDIENCE.to_string(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Generate a signed refresh token with the default 7-day expiry.
pub fn generate_refresh_token(
    subject: &str,
    issuer: &str,
    secret: &[u8],
) -> Result<String, AuthError> {
    generate_refresh_token_with_ttl(subject, issuer, secret, REFRESH_TOKEN_EXPIRY_SECS)
}

/// Generate a signed refresh token with an explicit TTL.
pub fn generate_refresh_token_with_ttl(
    subject: &str,
    issuer: &str,
    secret: &[u8],
    ttl_secs: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: subject.to_string(),
        iss: issuer.to_string(),
        aud: REFRESH_TOKEN_AUDIENCE.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify an access token, returning the claims on success.
///
/// Fails closed: any signature, expiry, issuer, or audience problem yields
/// `None`.
pub fn verify_access_token(token: &str, issuer: &str, secret: &[u8]) -> Option<AccessClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
    decode::<AccessClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Verify a refresh token, distinguishing expiry from other failures so the
/// caller can purge stale state on `TokenExpired`.
pub fn verify_refresh_token(
    token: &str,
    issuer: &str,
    secret: &[u8],
) -> Result<RefreshClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[REFRESH_TOKEN_AUDIENCE]);
    decode::<RefreshClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenError(format!("refresh token: {e}")),
        })
}

/// Best-effort read of a token's `exp` claim without verifying the signature.
///
/// Used where only the embedded expiry matters (staleness checks on stored
/// tokens, cache expiries); trust decisions always go through the verifying
/// functions above.
pub fn decode_expiry_unverified(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(value.get("exp")?.as_i64()?, 0)
}

/// Resolve the shared token secret: env var `TOKEN_SECRET` → `AUTH_SECRET`
/// → persisted file.
pub fn resolve_token_secret() -> String {
    if let Ok(secret) = std::env::var("TOKEN_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = token_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new token secret");
    secret
}

/// Path to the persisted token secret file.
fn token_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("authgate")
        .join("token-secret")
}
