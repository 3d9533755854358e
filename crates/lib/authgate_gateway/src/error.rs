//! Application error types.
//!
//! Storage and network failures are translated into this taxonomy at the
//! orchestrator boundary; raw sqlx/reqwest errors never reach handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown email or wrong password — deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Access-token verification failed; callers treat this as
    /// unauthenticated, never as a server fault.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Renewal was requested without an `X-User-ID` hint.
    #[error("User ID required")]
    UserHintRequired,

    /// No stored refresh token for the user.
    #[error("No active session")]
    NoActiveSession,

    /// The stored refresh token is past its embedded expiry; the record has
    /// been purged.
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// The issuer rejected the stored refresh token; the record has been
    /// purged.
    #[error("Refresh token rejected")]
    RefreshTokenInvalid,

    /// Transient issuer failure (connect error, timeout, 5xx). No local
    /// state was mutated; safe to retry.
    #[error("Identity service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The issuer answered with something outside the wire contract.
    #[error("Invalid identity service response: {0}")]
    InvalidResponse(String),

    /// A mapping row exists but its local user does not. Data-integrity
    /// fault; surfaced as a 5xx, never retried.
    #[error("Identity mapping inconsistent for issuer user {0}")]
    InconsistentMapping(i64),

    /// Unique-constraint race on first login. Resolved internally by
    /// re-reading the winner; only surfaces if the re-read also fails.
    #[error("Identity mapping conflict")]
    MappingConflict,

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_login: Option<bool>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, requires_login) = match &self {
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::UserHintRequired => {
                (StatusCode::UNAUTHORIZED, "unauthorized", None)
            }
            AppError::NoActiveSession
            | AppError::RefreshTokenExpired
            | AppError::RefreshTokenInvalid => {
                (StatusCode::UNAUTHORIZED, "unauthorized", Some(true))
            }
            AppError::ServiceUnavailable(_) | AppError::InvalidResponse(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", None)
            }
            AppError::InconsistentMapping(_)
            | AppError::MappingConflict
            | AppError::Db(_)
            | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };
        let message = match &self {
            // Never leak driver/integrity detail to clients.
            AppError::InconsistentMapping(_)
            | AppError::MappingConflict
            | AppError::Db(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            requires_login,
        });
        (status, body).into_response()
    }
}

impl From<authgate_core::auth::AuthError> for AppError {
    fn from(e: authgate_core::auth::AuthError) -> Self {
        use authgate_core::auth::AuthError;
        match e {
            AuthError::CredentialError => AppError::InvalidCredentials,
            AuthError::TokenExpired | AuthError::TokenError(_) => AppError::InvalidToken,
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
