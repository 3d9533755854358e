//! # authgate_client
//!
//! Typed client for the gateway's cookie-based session API, plus the
//! background renewal agent that keeps the access token fresh. The
//! reqwest cookie store stands in for the browser cookie jar.

pub mod api;
pub mod error;
pub mod renewal;
pub mod session;

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::api::{
    ErrorBody, LoginRequest, LoginResponse, RenewTokenResponse, SessionResponse, SessionUser,
};
use crate::error::ClientError;
use crate::session::SessionContext;

/// Header carrying the local-user hint for session recovery and renewal.
const X_USER_ID: &str = "X-User-ID";

/// Timeout for calls to the gateway.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the gateway's `/api/v1` surface.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl GatewayClient {
    /// Build a client for the given base URL (including the `/api/v1`
    /// prefix), holding cookies across requests like a browser would.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Url::parse(base_url).map_err(|e| ClientError::BaseUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: SessionContext::default(),
        })
    }

    /// The session context this client reads and maintains.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach the `X-User-ID` hint when a user is logged in.
    fn with_hint(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.get() {
            Some(user) => builder.header(X_USER_ID, user.id.to_string()),
            None => builder,
        }
    }

    async fn unexpected(resp: reqwest::Response) -> ClientError {
        let status = resp.status().as_u16();
        let body: ErrorBody = resp.json().await.unwrap_or_default();
        ClientError::UnexpectedStatus {
            status,
            message: body.message,
        }
    }

    /// Log in with email + password. On success the session context holds
    /// the returned user and the access-token cookie is in the jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => {
                let body: LoginResponse = resp.json().await?;
                self.session.set(body.user.clone());
                Ok(body.user)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::InvalidCredentials),
            _ => Err(Self::unexpected(resp).await),
        }
    }

    /// Probe the session endpoint. On a valid answer the session context is
    /// refreshed with the returned user.
    pub async fn check_session(&self) -> Result<SessionResponse, ClientError> {
        let resp = self
            .with_hint(self.http.get(self.url("/auth/session")))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::unexpected(resp).await);
        }
        let body: SessionResponse = resp.json().await?;
        if body.valid && let Some(user) = &body.user {
            self.session.set(user.clone());
        }
        Ok(body)
    }

    /// Renew the access token for the logged-in user.
    pub async fn renew_token(&self) -> Result<RenewTokenResponse, ClientError> {
        let user = self.session.get().ok_or(ClientError::NoSession)?;
        let resp = self
            .http
            .post(self.url("/auth/renew-token"))
            .header(X_USER_ID, user.id.to_string())
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            StatusCode::UNAUTHORIZED => Err(ClientError::SessionExpired),
            _ => Err(Self::unexpected(resp).await),
        }
    }

    /// Log out. The session context is cleared no matter what the gateway
    /// answers.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .with_hint(self.http.post(self.url("/auth/logout")))
            .send()
            .await;
        self.session.clear();
        let resp = result?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected(resp).await)
        }
    }
}
