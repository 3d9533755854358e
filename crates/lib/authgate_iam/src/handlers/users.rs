//! User-management handlers.

use authgate_core::models::contract::IamUser;
use axum::extract::{Path, State};
use axum::{Json, http::StatusCode};

use crate::AppState;
use crate::api::{CreateUserRequest, UpdateUserRequest};
use crate::error::AppResult;
use crate::services::accounts;

/// `GET /users` — list all users.
pub async fn list_users_handler(State(state): State<AppState>) -> AppResult<Json<Vec<IamUser>>> {
    let users = accounts::list_users(&state.pool).await?;
    Ok(Json(users.into_iter().map(IamUser::from).collect()))
}

/// `POST /users` — create a user account.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<IamUser>)> {
    let user = accounts::create_user(&state.pool, &body.email, &body.name, &body.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `GET /users/{id}` — fetch one user.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<IamUser>> {
    let user = accounts::get_user(&state.pool, id).await?;
    Ok(Json(user.into()))
}

/// `PUT /users/{id}` — update profile fields or password.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<IamUser>> {
    let user = accounts::update_user(&state.pool, id, body).await?;
    Ok(Json(user.into()))
}
