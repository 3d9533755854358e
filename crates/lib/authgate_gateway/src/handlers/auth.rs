//! Session endpoint handlers.

use authgate_core::auth::jwt::ACCESS_TOKEN_EXPIRY_SECS;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::api::{
    LoginRequest, LoginResponse, MessageResponse, RenewTokenResponse, SessionResponse,
    ValidateResponse,
};
use crate::error::{AppError, AppResult};
use crate::services::{cookies, session};

/// Read the `X-User-ID` local-user hint. Unparseable values are treated as
/// absent.
fn user_hint(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("x-user-id")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// `POST /auth/login` — authenticate against the issuer and establish a
/// local session. The access token is delivered both in the body and as an
/// httpOnly cookie; the refresh token stays server-side.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let outcome = session::login(&state, &body.email, &body.password).await?;
    let jar = jar.add(cookies::access_cookie(
        &outcome.access_token,
        outcome.expires_in,
        state.config.cookie_secure,
    ));
    Ok((
        jar,
        Json(LoginResponse {
            access_token: outcome.access_token,
            expires_in: outcome.expires_in,
            user: outcome.user.into(),
        }),
    ))
}

/// `POST /auth/renew-token` — exchange the stored refresh token for a fresh
/// access token, keyed by the `X-User-ID` hint.
pub async fn renew_token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<RenewTokenResponse>)> {
    let local_id = user_hint(&headers).ok_or(AppError::UserHintRequired)?;
    let renewed = session::renew_access_token(&state, local_id).await?;
    let jar = jar.add(cookies::access_cookie(
        &renewed.access_token,
        renewed.expires_in,
        state.config.cookie_secure,
    ));
    Ok((
        jar,
        Json(RenewTokenResponse {
            access_token: renewed.access_token,
            expires_in: renewed.expires_in,
            refresh_token_updated: renewed.refresh_token_updated,
        }),
    ))
}

/// `GET /auth/session` — probe session validity. Always 200; when the probe
/// recovers a session from the stored refresh token, the fresh access token
/// is set as a cookie and echoed in the body.
pub async fn session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    let cookie_token = jar
        .get(cookies::ACCESS_COOKIE)
        .map(|c| c.value().to_string());

    let status = session::probe_session(&state, cookie_token.as_deref(), user_hint(&headers)).await;

    let jar = match status.access_token.as_deref() {
        Some(token) => jar.add(cookies::access_cookie(
            token,
            ACCESS_TOKEN_EXPIRY_SECS,
            state.config.cookie_secure,
        )),
        None => jar,
    };

    (
        jar,
        Json(SessionResponse {
            valid: status.valid,
            user: status.user.map(Into::into),
            access_token: status.access_token,
        }),
    )
}

/// `POST /auth/logout` — delete the local session and clear the cookie.
/// Always succeeds locally.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    session::logout(&state, user_hint(&headers)).await?;
    let jar = jar.add(cookies::clear_access_cookie(state.config.cookie_secure));
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    ))
}

/// `GET /auth/validate` — stateless Bearer-token validation.
pub async fn validate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ValidateResponse>> {
    let token = bearer_token(&headers).ok_or(AppError::InvalidToken)?;
    let user = session::validate_access_token(&state, token)
        .await
        .ok_or(AppError::InvalidToken)?;
    Ok(Json(ValidateResponse {
        valid: true,
        user: user.into(),
    }))
}
