//! Client error types.

use thiserror::Error;

/// Errors surfaced by the gateway client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No user in the session context; the operation needs a logged-in user.
    #[error("No active session")]
    NoSession,

    /// The gateway reported the session as terminally dead (401); a fresh
    /// login is required.
    #[error("Session expired; login required")]
    SessionExpired,

    #[error("Unexpected response ({status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    BaseUrl(String),
}
