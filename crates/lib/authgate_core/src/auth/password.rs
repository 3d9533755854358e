//! Password hashing via bcrypt.

use std::sync::OnceLock;

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// Burn the same bcrypt work as a real verification, then fail.
///
/// Called on lookups for unknown emails so the credential check costs the
/// same whether or not the account exists.
pub fn verify_password_dummy(password: &str) -> Result<bool, AuthError> {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| {
        bcrypt::hash("authgate-dummy-password", BCRYPT_COST).expect("bcrypt hash of constant input")
    });
    verify_password(password, hash)?;
    Ok(false)
}
