//! Token issuance, validation, and sliding-window renewal.

use authgate_core::auth::jwt::{
    self, ACCESS_TOKEN_EXPIRY_SECS, REFRESH_RENEWAL_WINDOW_SECS, REFRESH_TOKEN_EXPIRY_SECS,
};
use authgate_core::auth::password;
use authgate_core::identity::ExternalId;
use authgate_core::models::contract::{
    AuthenticateResponse, InvalidateTokensResponse, RefreshTokenPayload, RenewTokensResponse,
    ValidateRefreshResponse,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::config::IamConfig;
use crate::error::{AppError, AppResult};
use crate::models::UserRecord;
use crate::store;

/// Sliding-window policy: a refresh token is reissued only when less than
/// the renewal window of its life remains.
pub fn should_rotate(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at - now < Duration::seconds(REFRESH_RENEWAL_WINDOW_SECS)
}

fn mint_access_token(config: &IamConfig, user: &UserRecord) -> AppResult<String> {
    jwt::generate_access_token(
        &user.id.to_string(),
        &user.email,
        &user.name,
        &config.token_issuer,
        config.token_secret.as_bytes(),
    )
    .map_err(AppError::from)
}

/// Authenticate with email + password, minting a fresh token pair.
pub async fn authenticate(
    pool: &PgPool,
    config: &IamConfig,
    email: &str,
    password_input: &str,
) -> AppResult<AuthenticateResponse> {
    let user = match store::users::find_by_email(pool, email).await? {
        Some(user) => user,
        None => {
            // Unknown email burns the same bcrypt work as a real check so
            // both failure modes cost the same.
            password::verify_password_dummy(password_input)?;
            return Err(AppError::InvalidCredentials);
        }
    };

    if !password::verify_password(password_input, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let access_token = mint_access_token(config, &user)?;
    let refresh_token = jwt::generate_refresh_token(
        &user.id.to_string(),
        &config.token_issuer,
        config.token_secret.as_bytes(),
    )?;

    let expires_at = jwt::decode_expiry_unverified(&refresh_token)
        .unwrap_or_else(|| Utc::now() + Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS));
    store::refresh_tokens::upsert(pool, user.id, &refresh_token, expires_at).await?;

    info!(email = %user.email, "user authenticated");

    Ok(AuthenticateResponse {
        user: user.into(),
        access_token,
        refresh_token,
        expires_in: ACCESS_TOKEN_EXPIRY_SECS,
    })
}

/// Validate a refresh token by signature and expiry alone.
///
/// Expired or malformed tokens are a `valid: false` answer, not an error;
/// no storage is consulted.
pub fn validate_refresh_token(config: &IamConfig, refresh_token: &str) -> ValidateRefreshResponse {
    match jwt::verify_refresh_token(
        refresh_token,
        &config.token_issuer,
        config.token_secret.as_bytes(),
    ) {
        Ok(claims) => match DateTime::from_timestamp(claims.exp, 0) {
            Some(expires_at) => ValidateRefreshResponse {
                valid: true,
                payload: Some(RefreshTokenPayload {
                    user_id: ExternalId::from_subject(&claims.sub),
                    expires_at,
                }),
            },
            None => ValidateRefreshResponse {
                valid: false,
                payload: None,
            },
        },
        Err(_) => ValidateRefreshResponse {
            valid: false,
            payload: None,
        },
    }
}

/// Exchange a refresh token for a new access token, reissuing the refresh
/// token only inside its renewal window.
pub async fn renew_tokens(
    pool: &PgPool,
    config: &IamConfig,
    refresh_token: &str,
) -> AppResult<RenewTokensResponse> {
    let claims = jwt::verify_refresh_token(
        refresh_token,
        &config.token_issuer,
        config.token_secret.as_bytes(),
    )?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::InvalidToken("unknown subject".into()))?;
    let user = store::users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::InvalidToken("unknown subject".into()))?;

    let access_token = mint_access_token(config, &user)?;

    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::InvalidToken("unreadable expiry".into()))?;

    if should_rotate(expires_at, Utc::now()) {
        let new_refresh = jwt::generate_refresh_token(
            &claims.sub,
            &config.token_issuer,
            config.token_secret.as_bytes(),
        )?;
        let new_expires = jwt::decode_expiry_unverified(&new_refresh)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS));
        store::refresh_tokens::upsert(pool, user.id, &new_refresh, new_expires).await?;

        info!(user_id = user.id, "refresh token rotated inside renewal window");

        Ok(RenewTokensResponse {
            access_token,
            refresh_token: new_refresh,
            expires_in: ACCESS_TOKEN_EXPIRY_SECS,
            refresh_token_updated: true,
        })
    } else {
        Ok(RenewTokensResponse {
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: ACCESS_TOKEN_EXPIRY_SECS,
            refresh_token_updated: false,
        })
    }
}

/// Drop the bookkeeping record for a refresh token (logout notification).
pub async fn invalidate_tokens(
    pool: &PgPool,
    refresh_token: &str,
) -> AppResult<InvalidateTokensResponse> {
    let invalidated = store::refresh_tokens::delete_by_token(pool, refresh_token).await?;
    Ok(InvalidateTokensResponse { invalidated })
}
