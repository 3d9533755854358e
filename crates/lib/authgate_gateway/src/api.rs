//! Wire types for the gateway's own HTTP surface.

use serde::{Deserialize, Serialize};

use crate::models::UserView;

/// `POST /auth/login` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` response body. The refresh token never appears here;
/// it stays server-side, keyed by the local user.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: UserView,
}

/// `POST /auth/renew-token` response body.
#[derive(Debug, Clone, Serialize)]
pub struct RenewTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token_updated: bool,
}

/// `GET /auth/session` response body. Always delivered with HTTP 200.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    /// Present when the probe minted a fresh access token from the stored
    /// refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// `GET /auth/validate` response body.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user: UserView,
}

/// Generic message body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
