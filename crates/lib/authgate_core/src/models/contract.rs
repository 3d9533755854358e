//! Wire contract between the gateway and the IAM issuer.
//!
//! Every cross-service payload is an explicit schema shared by both sides;
//! responses that fail to parse are rejected at the client boundary instead
//! of crossing it as dynamic values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::ExternalId;

/// User record as reported by the issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamUser {
    pub id: ExternalId,
    pub email: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// `POST /users/authenticate` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

/// `POST /users/authenticate` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub user: IamUser,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Request body shared by the refresh-token operations
/// (`validate-refresh-token`, `renew-tokens`, `invalidate-tokens`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// `POST /users/validate-refresh-token` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRefreshResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<RefreshTokenPayload>,
}

/// Claims surfaced by a successful refresh-token validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenPayload {
    pub user_id: ExternalId,
    pub expires_at: DateTime<Utc>,
}

/// `POST /users/renew-tokens` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewTokensResponse {
    pub access_token: String,
    /// The refresh token to hold going forward. Identical to the presented
    /// one unless `refresh_token_updated` is set.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// True when the refresh token was reissued (sliding-window renewal).
    pub refresh_token_updated: bool,
}

/// `POST /users/invalidate-tokens` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateTokensResponse {
    pub invalidated: bool,
}
