//! # authgate_gateway
//!
//! The auth gateway as an axum router library: mediates between browser
//! clients and the IAM issuer, mirroring identities locally, persisting one
//! refresh token per user, and serving the cookie-based session API.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod iam;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::GatewayConfig;
use crate::error::AppResult;
use crate::handlers::{auth, profile};
use crate::iam::IamClient;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// Service configuration.
    pub config: GatewayConfig,
    /// Outbound client for the IAM issuer.
    pub iam: IamClient,
}

impl AppState {
    /// Build state from config, constructing the outbound issuer client.
    pub fn new(pool: PgPool, config: GatewayConfig) -> AppResult<Self> {
        let iam = IamClient::new(
            &config.iam_base_url,
            Duration::from_secs(config.iam_timeout_secs),
        )?;
        Ok(Self { pool, config, iam })
    }
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

    // Session endpoints (no auth required — they establish or probe it)
    let public = Router::new()
        .route("/api/v1/auth/login", post(auth::login_handler))
        .route("/api/v1/auth/renew-token", post(auth::renew_token_handler))
        .route("/api/v1/auth/session", get(auth::session_handler))
        .route("/api/v1/auth/logout", post(auth::logout_handler))
        .route("/api/v1/auth/validate", get(auth::validate_handler));

    // Protected routes (require a valid access token)
    let protected = Router::new()
        .route("/api/v1/profile", get(profile::profile_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
