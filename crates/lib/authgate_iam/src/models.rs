//! Issuer-side domain models.

use authgate_core::identity::ExternalId;
use authgate_core::models::contract::IamUser;
use chrono::{DateTime, Utc};

/// Full user row including the credential hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for IamUser {
    fn from(u: UserRecord) -> Self {
        IamUser {
            id: ExternalId::Numeric(u.id),
            email: u.email,
            name: u.name,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
