//! Authentication middleware for protected routes.
//!
//! Accepts the access token from either `Authorization: Bearer` (API
//! clients) or the session cookie (browsers) and injects the resolved local
//! user into request extensions. Fails closed with a 401 on any
//! verification problem.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::AppError;
use crate::models::LocalUser;
use crate::services::{cookies, session};

/// Key used to store the resolved user in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub LocalUser);

/// Axum middleware: extracts the access token, validates it against the
/// identity mapping, and injects `AuthenticatedUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let cookie = jar.get(cookies::ACCESS_COOKIE).map(|c| c.value().to_string());

    let token = bearer.or(cookie).ok_or(AppError::InvalidToken)?;

    let user = session::validate_access_token(&state, &token)
        .await
        .ok_or(AppError::InvalidToken)?;

    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}
