//! Issuer-space user identifiers and their folding into the mapping key space.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A user identifier as reported by the token issuer: either a numeric ID or
/// an opaque external identifier such as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Numeric(i64),
    Opaque(String),
}

impl ExternalId {
    /// Build an identifier from a JWT `sub` claim string.
    pub fn from_subject(subject: &str) -> ExternalId {
        match subject.parse::<i64>() {
            Ok(n) => ExternalId::Numeric(n),
            Err(_) => ExternalId::Opaque(subject.to_string()),
        }
    }

    /// Fold the identifier into the signed 64-bit key space used by the
    /// identity mapping table.
    ///
    /// Numeric IDs (and strings that parse as one) map to themselves. Opaque
    /// IDs are folded through SHA-256 truncated to 63 bits. The fold is
    /// deterministic but lossy: with n mapped opaque identities a collision
    /// occurs with probability ~n²/2⁶⁴ and would alias two issuer identities
    /// onto one local user. A known limitation, not a uniqueness guarantee.
    pub fn fold(&self) -> i64 {
        match self {
            ExternalId::Numeric(n) => *n,
            ExternalId::Opaque(s) => match s.parse::<i64>() {
                Ok(n) => n,
                Err(_) => {
                    let digest = Sha256::digest(s.as_bytes());
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(&digest[..8]);
                    i64::from_be_bytes(bytes) & i64::MAX
                }
            },
        }
    }
}

impl From<i64> for ExternalId {
    fn from(id: i64) -> Self {
        ExternalId::Numeric(id)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Numeric(n) => write!(f, "{n}"),
            ExternalId::Opaque(s) => f.write_str(s),
        }
    }
}
