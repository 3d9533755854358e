//! # authgate_core
//!
//! Domain logic shared by the IAM issuer and the auth gateway: token
//! minting and verification, password hashing, issuer-identity folding,
//! and the wire contract both services speak.

pub mod auth;
pub mod identity;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
