//! Outbound HTTP client for the IAM issuer.
//!
//! Every call carries a bounded timeout; transport failures surface as
//! `ServiceUnavailable` so transient issuer outages are never conflated with
//! credential or token rejection. Responses outside the wire contract are
//! rejected as `InvalidResponse`.

use std::time::Duration;

use authgate_core::models::contract::{
    AuthenticateRequest, AuthenticateResponse, InvalidateTokensResponse, RefreshTokenRequest,
    RenewTokensResponse, ValidateRefreshResponse,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};

/// HTTP client for the issuer's `/api/v1` surface.
#[derive(Clone)]
pub struct IamClient {
    http: reqwest::Client,
    base_url: String,
}

impl IamClient {
    /// Build a client for the given base URL (including the `/api/v1`
    /// prefix) with a bounded per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        Url::parse(base_url).map_err(|e| AppError::Internal(format!("IAM base URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: &impl serde::Serialize) -> AppResult<reqwest::Response> {
        self.http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(e.to_string()))
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
        resp.json::<T>()
            .await
            .map_err(|e| AppError::InvalidResponse(e.to_string()))
    }

    /// `POST /users/authenticate`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<AuthenticateResponse> {
        let resp = self
            .post(
                "/users/authenticate",
                &AuthenticateRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        match resp.status() {
            s if s.is_success() => Self::parse(resp).await,
            StatusCode::UNAUTHORIZED => Err(AppError::InvalidCredentials),
            s if s.is_server_error() => {
                Err(AppError::ServiceUnavailable(format!("issuer returned {s}")))
            }
            s => Err(AppError::InvalidResponse(format!("unexpected status {s}"))),
        }
    }

    /// `POST /users/validate-refresh-token`. Always 200 by contract.
    pub async fn validate_refresh_token(&self, token: &str) -> AppResult<ValidateRefreshResponse> {
        let resp = self
            .post(
                "/users/validate-refresh-token",
                &RefreshTokenRequest {
                    refresh_token: token.to_string(),
                },
            )
            .await?;
        match resp.status() {
            s if s.is_success() => Self::parse(resp).await,
            s if s.is_server_error() => {
                Err(AppError::ServiceUnavailable(format!("issuer returned {s}")))
            }
            s => Err(AppError::InvalidResponse(format!("unexpected status {s}"))),
        }
    }

    /// `POST /users/renew-tokens`.
    pub async fn renew_tokens(&self, token: &str) -> AppResult<RenewTokensResponse> {
        let resp = self
            .post(
                "/users/renew-tokens",
                &RefreshTokenRequest {
                    refresh_token: token.to_string(),
                },
            )
            .await?;
        match resp.status() {
            s if s.is_success() => Self::parse(resp).await,
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                Err(AppError::RefreshTokenInvalid)
            }
            s if s.is_server_error() => {
                Err(AppError::ServiceUnavailable(format!("issuer returned {s}")))
            }
            s => Err(AppError::InvalidResponse(format!("unexpected status {s}"))),
        }
    }

    /// `POST /users/invalidate-tokens` (best-effort logout notification).
    pub async fn invalidate_tokens(&self, token: &str) -> AppResult<InvalidateTokensResponse> {
        let resp = self
            .post(
                "/users/invalidate-tokens",
                &RefreshTokenRequest {
                    refresh_token: token.to_string(),
                },
            )
            .await?;
        match resp.status() {
            s if s.is_success() => Self::parse(resp).await,
            s if s.is_server_error() => {
                Err(AppError::ServiceUnavailable(format!("issuer returned {s}")))
            }
            s => Err(AppError::InvalidResponse(format!("unexpected status {s}"))),
        }
    }
}
