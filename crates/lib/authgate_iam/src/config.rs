//! IAM service configuration.

use authgate_core::auth::jwt::resolve_token_secret;

/// Configuration for the IAM service.
#[derive(Clone, Debug)]
pub struct IamConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3001").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Shared token signing secret.
    pub token_secret: String,
    /// Value of the `iss` claim on minted tokens.
    pub token_issuer: String,
}

impl IamConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                       | Default                                  |
    /// |--------------------------------|------------------------------------------|
    /// | `BIND_ADDR`                    | `127.0.0.1:3001`                         |
    /// | `DATABASE_URL`                 | `postgres://localhost:5432/authgate_iam` |
    /// | `TOKEN_SECRET` / `AUTH_SECRET` | generated & persisted to file            |
    /// | `TOKEN_ISSUER`                 | `authgate`                               |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/authgate_iam".into()),
            token_secret: resolve_token_secret(),
            token_issuer: std::env::var("TOKEN_ISSUER").unwrap_or_else(|_| "authgate".into()),
        }
    }
}
