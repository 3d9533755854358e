//! Identity-mapping queries: write-once 1:1 rows between issuer-space and
//! gateway-space user IDs.
//!
//! No update or delete is exposed; a changed profile at the issuer changes
//! the mirrored user row, never the mapping.

use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;

/// Insert a mapping row. The unique constraints on both columns are the
/// enforcement point for concurrent first-logins; a violation surfaces as
/// `MappingConflict` and the caller re-reads the winner's row.
pub async fn create_mapping(
    ex: impl PgExecutor<'_>,
    iam_user_id: i64,
    auth_user_id: i64,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO iam_user_mappings (iam_user_id, auth_user_id) VALUES ($1, $2)")
        .bind(iam_user_id)
        .bind(auth_user_id)
        .execute(ex)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|d| d.is_unique_violation())
            {
                AppError::MappingConflict
            } else {
                AppError::Db(e)
            }
        })?;
    Ok(())
}

/// Resolve an issuer-space ID to the local user ID.
pub async fn find_local_id_by_issuer_id(
    pool: &PgPool,
    iam_user_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT auth_user_id FROM iam_user_mappings WHERE iam_user_id = $1",
    )
    .bind(iam_user_id)
    .fetch_optional(pool)
    .await
}

/// Resolve a local user ID back to the issuer-space ID.
pub async fn find_issuer_id_by_local_id(
    pool: &PgPool,
    auth_user_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT iam_user_id FROM iam_user_mappings WHERE auth_user_id = $1",
    )
    .bind(auth_user_id)
    .fetch_optional(pool)
    .await
}

/// Check whether either side of a prospective mapping is already taken.
/// A match on either column counts as a conflict (strict 1:1).
pub async fn mapping_exists(
    pool: &PgPool,
    iam_user_id: i64,
    auth_user_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM iam_user_mappings \
         WHERE iam_user_id = $1 OR auth_user_id = $2)",
    )
    .bind(iam_user_id)
    .bind(auth_user_id)
    .fetch_one(pool)
    .await
}
