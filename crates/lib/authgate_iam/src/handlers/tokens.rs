//! Token endpoint handlers.

use authgate_core::models::contract::{
    AuthenticateRequest, AuthenticateResponse, InvalidateTokensResponse, RefreshTokenRequest,
    RenewTokensResponse, ValidateRefreshResponse,
};
use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::services::tokens;

/// `POST /users/authenticate` — verify credentials, mint a token pair.
pub async fn authenticate_handler(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateRequest>,
) -> AppResult<Json<AuthenticateResponse>> {
    let resp = tokens::authenticate(&state.pool, &state.config, &body.email, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /users/validate-refresh-token` — signature/expiry check, always 200.
pub async fn validate_refresh_token_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Json<ValidateRefreshResponse> {
    Json(tokens::validate_refresh_token(
        &state.config,
        &body.refresh_token,
    ))
}

/// `POST /users/renew-tokens` — mint a new access token; rotate the refresh
/// token inside its renewal window.
pub async fn renew_tokens_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> AppResult<Json<RenewTokensResponse>> {
    let resp = tokens::renew_tokens(&state.pool, &state.config, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `POST /users/invalidate-tokens` — drop the bookkeeping record (logout).
pub async fn invalidate_tokens_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> AppResult<Json<InvalidateTokensResponse>> {
    let resp = tokens::invalidate_tokens(&state.pool, &body.refresh_token).await?;
    Ok(Json(resp))
}
