//! Local user-mirror queries.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;
use crate::models::LocalUser;

type UserRow = (i64, String, String, DateTime<Utc>, DateTime<Utc>);

fn into_user(row: UserRow) -> LocalUser {
    LocalUser {
        id: row.0,
        email: row.1,
        name: row.2,
        created_at: row.3,
        updated_at: row.4,
    }
}

/// Fetch a local user by ID.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<LocalUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_user))
}

/// Create a local mirror row for an issuer identity.
///
/// A unique-constraint violation on email means a concurrent login already
/// mirrored this identity; it is reported as `MappingConflict` so the caller
/// re-reads the winner.
pub async fn create(
    ex: impl PgExecutor<'_>,
    email: &str,
    name: &str,
) -> Result<LocalUser, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (email, name) VALUES ($1, $2) \
         RETURNING id, email, name, created_at, updated_at",
    )
    .bind(email)
    .bind(name)
    .fetch_one(ex)
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
    Ok(into_user(row))
}

/// Overwrite mutable profile fields mirrored from the issuer.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    email: &str,
    name: &str,
) -> Result<Option<LocalUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET email = $2, name = $3, updated_at = now() \
         WHERE id = $1 \
         RETURNING id, email, name, created_at, updated_at",
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_user))
}
