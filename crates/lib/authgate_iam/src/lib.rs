//! # authgate_iam
//!
//! The IAM issuer as an axum router library: owns user records and
//! credentials, mints access/refresh token pairs, and renews refresh tokens
//! on a sliding window.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::IamConfig;
use crate::handlers::{tokens, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// Service configuration.
    pub config: IamConfig,
}

/// Run embedded database migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Builds the axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/v1/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            "/api/v1/users/authenticate",
            post(tokens::authenticate_handler),
        )
        .route(
            "/api/v1/users/validate-refresh-token",
            post(tokens::validate_refresh_token_handler),
        )
        .route("/api/v1/users/renew-tokens", post(tokens::renew_tokens_handler))
        .route(
            "/api/v1/users/invalidate-tokens",
            post(tokens::invalidate_tokens_handler),
        )
        .route(
            "/api/v1/users/{id}",
            get(users::get_user_handler).put(users::update_user_handler),
        )
        .layer(cors)
        .with_state(state)
}
