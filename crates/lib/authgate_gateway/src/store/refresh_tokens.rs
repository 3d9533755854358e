//! Local session-store queries: at most one live refresh token per user.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::StoredRefreshToken;

/// Create-or-replace the refresh token for a local user. The primary key on
/// `user_id` makes this the single mutation path that preserves the
/// one-row-per-user invariant, even across process instances.
pub async fn upsert(
    pool: &PgPool,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
    external_token: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token, external_token, expires_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id) DO UPDATE \
         SET token = EXCLUDED.token, \
             external_token = EXCLUDED.external_token, \
             expires_at = EXCLUDED.expires_at, \
             created_at = now()",
    )
    .bind(user_id)
    .bind(token)
    .bind(external_token)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch the stored refresh token for a local user.
pub async fn find_by_user_id(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<StoredRefreshToken>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, String, Option<String>, DateTime<Utc>, DateTime<Utc>)>(
        "SELECT user_id, token, external_token, expires_at, created_at \
         FROM refresh_tokens WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(user_id, token, external_token, expires_at, created_at)| StoredRefreshToken {
            user_id,
            token,
            external_token,
            expires_at,
            created_at,
        },
    ))
}

/// Delete the refresh token for a local user. Idempotent.
pub async fn delete(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove all rows whose expiry has passed. Idempotent and safe to run
/// concurrently with reads.
pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
