//! Wire types for the gateway's session API, as seen from the client side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User projection delivered by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `POST /auth/login` request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: SessionUser,
}

/// `POST /auth/renew-token` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RenewTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token_updated: bool,
}

/// `GET /auth/session` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub requires_login: Option<bool>,
}
