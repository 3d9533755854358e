//! Gateway-side domain models.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Locally mirrored user.
#[derive(Debug, Clone)]
pub struct LocalUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User projection returned to browsers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LocalUser> for UserView {
    fn from(u: LocalUser) -> Self {
        UserView {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Stored refresh-token record for a local user.
#[derive(Debug, Clone)]
pub struct StoredRefreshToken {
    pub user_id: i64,
    pub token: String,
    /// The token as understood by the issuer, when it differs from the
    /// internally held representation.
    pub external_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
