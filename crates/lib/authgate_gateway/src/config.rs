//! Gateway service configuration.

use authgate_core::auth::jwt::resolve_token_secret;

/// Configuration for the gateway service.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3002").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Base URL of the IAM issuer API (including the `/api/v1` prefix).
    pub iam_base_url: String,
    /// Timeout for outbound calls to the issuer, in seconds.
    pub iam_timeout_secs: u64,
    /// Shared token signing secret (same secret the issuer signs with).
    pub token_secret: String,
    /// Expected `iss` claim on tokens; also used when minting locally.
    pub token_issuer: String,
    /// Whether to set the `Secure` attribute on session cookies.
    pub cookie_secure: bool,
}

impl GatewayConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                       | Default                                   |
    /// |--------------------------------|-------------------------------------------|
    /// | `BIND_ADDR`                    | `127.0.0.1:3002`                          |
    /// | `DATABASE_URL`                 | `postgres://localhost:5432/authgate_auth` |
    /// | `IAM_BASE_URL`                 | `http://127.0.0.1:3001/api/v1`            |
    /// | `IAM_TIMEOUT_SECS`             | `5`                                       |
    /// | `TOKEN_SECRET` / `AUTH_SECRET` | generated & persisted to file             |
    /// | `TOKEN_ISSUER`                 | `authgate`                                |
    /// | `COOKIE_SECURE`                | `false`                                   |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3002".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/authgate_auth".into()),
            iam_base_url: std::env::var("IAM_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3001/api/v1".into()),
            iam_timeout_secs: std::env::var("IAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            token_secret: resolve_token_secret(),
            token_issuer: std::env::var("TOKEN_ISSUER").unwrap_or_else(|_| "authgate".into()),
            cookie_secure: matches!(
                std::env::var("COOKIE_SECURE").as_deref(),
                Ok("1") | Ok("true")
            ),
        }
    }
}
