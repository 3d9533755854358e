//! User table queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::UserRecord;

type UserRow = (i64, String, String, String, DateTime<Utc>, DateTime<Utc>);

fn into_record(row: UserRow) -> UserRecord {
    UserRecord {
        id: row.0,
        email: row.1,
        name: row.2,
        password_hash: row.3,
        created_at: row.4,
        updated_at: row.5,
    }
}

/// Fetch a user by email.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, created_at, updated_at \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_record))
}

/// Fetch a user by ID.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, created_at, updated_at \
         FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_record))
}

/// List all users, oldest first.
pub async fn list(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, created_at, updated_at \
         FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(into_record).collect())
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

/// Create a new user.
pub async fn create(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<UserRecord, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) \
         RETURNING id, email, name, password_hash, created_at, updated_at",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(into_record(row))
}

/// Update a user's fields; `None` leaves the column unchanged.
pub async fn update(
    pool: &PgPool,
    id: i64,
    email: Option<&str>,
    name: Option<&str>,
    password_hash: Option<&str>,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users \
         SET email = COALESCE($2, email), \
             name = COALESCE($3, name), \
             password_hash = COALESCE($4, password_hash), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING id, email, name, password_hash, created_at, updated_at",
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(into_record))
}
