//! User account management.

use authgate_core::auth::password;
use sqlx::PgPool;
use tracing::info;

use crate::api::UpdateUserRequest;
use crate::error::{AppError, AppResult};
use crate::models::UserRecord;
use crate::store;

/// Create a new user account with a bcrypt-hashed password.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_input: &str,
) -> AppResult<UserRecord> {
    if password_input.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    if store::users::email_exists(pool, email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let password_hash = password::hash_password(password_input)?;
    let user = store::users::create(pool, email, name, &password_hash).await?;

    info!(email = %user.email, "user created");
    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: i64) -> AppResult<UserRecord> {
    store::users::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// List all users.
pub async fn list_users(pool: &PgPool) -> AppResult<Vec<UserRecord>> {
    Ok(store::users::list(pool).await?)
}

/// Update a user's profile or password.
pub async fn update_user(
    pool: &PgPool,
    id: i64,
    update: UpdateUserRequest,
) -> AppResult<UserRecord> {
    let password_hash = match update.password.as_deref() {
        Some(p) if p.len() < 8 => {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".into(),
            ));
        }
        Some(p) => Some(password::hash_password(p)?),
        None => None,
    };

    store::users::update(
        pool,
        id,
        update.email.as_deref(),
        update.name.as_deref(),
        password_hash.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))
}
