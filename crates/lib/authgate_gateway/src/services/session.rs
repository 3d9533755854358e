//! Session orchestrator — the gateway's core state machine.
//!
//! Reconciles three independent sources of truth: the issuer's
//! authentication decision, the local identity mapping, and the stored
//! refresh token. Per local user a session moves
//! `Anonymous → Authenticated → AccessExpired → Authenticated(renewed)`
//! until the refresh token expires, which is terminal and requires a fresh
//! login.

use authgate_core::auth::jwt;
use authgate_core::identity::ExternalId;
use authgate_core::models::contract::IamUser;
use chrono::Utc;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::LocalUser;
use crate::store;

/// Successful login outcome.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub expires_in: i64,
    pub user: LocalUser,
}

/// Successful renewal outcome.
#[derive(Debug)]
pub struct RenewedSession {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token_updated: bool,
}

/// Session probe outcome. The probe never errors; every failure mode is an
/// invalid session.
#[derive(Debug)]
pub struct SessionStatus {
    pub valid: bool,
    pub user: Option<LocalUser>,
    /// Present when the probe minted a fresh access token.
    pub access_token: Option<String>,
}

impl SessionStatus {
    fn invalid() -> Self {
        SessionStatus {
            valid: false,
            user: None,
            access_token: None,
        }
    }
}

/// Authenticate against the issuer and establish a local session.
///
/// `InvalidCredentials` and `ServiceUnavailable` from the issuer propagate
/// verbatim; the browser never learns whether the email or the password was
/// wrong.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<LoginOutcome> {
    let auth = state.iam.authenticate(email, password).await?;

    let user = resolve_identity(state, &auth.user).await?;

    // Policy: a fresh login always takes the newest refresh token. The
    // upsert replaces any previous session row for this user.
    let expires_at = jwt::decode_expiry_unverified(&auth.refresh_token).ok_or_else(|| {
        AppError::InvalidResponse("refresh token without readable expiry".into())
    })?;
    store::refresh_tokens::upsert(&state.pool, user.id, &auth.refresh_token, expires_at, None)
        .await?;

    info!(user_id = user.id, email = %user.email, "login succeeded");

    Ok(LoginOutcome {
        access_token: auth.access_token,
        expires_in: auth.expires_in,
        user,
    })
}

/// Map an issuer identity onto the local mirror, creating the user row and
/// mapping on first login and reconciling drifted profile fields afterward.
async fn resolve_identity(state: &AppState, iam_user: &IamUser) -> AppResult<LocalUser> {
    let iam_id = iam_user.id.fold();

    if let Some(local_id) =
        store::mappings::find_local_id_by_issuer_id(&state.pool, iam_id).await?
    {
        let user = store::users::find_by_id(&state.pool, local_id)
            .await?
            .ok_or(AppError::InconsistentMapping(iam_id))?;
        return reconcile_profile(state, user, iam_user).await;
    }

    // First login for this issuer identity. The mapping's unique constraints
    // arbitrate concurrent attempts: the loser rolls back and re-reads the
    // winner's row instead of erroring.
    let mut tx = state.pool.begin().await?;
    match create_user_and_mapping(&mut tx, iam_id, iam_user).await {
        Ok(user) => {
            tx.commit().await?;
            info!(
                iam_user_id = iam_id,
                local_user_id = user.id,
                "created local identity"
            );
            Ok(user)
        }
        Err(AppError::MappingConflict) => {
            let _ = tx.rollback().await;
            debug!(iam_user_id = iam_id, "lost first-login race, re-reading mapping");
            let local_id = store::mappings::find_local_id_by_issuer_id(&state.pool, iam_id)
                .await?
                .ok_or(AppError::MappingConflict)?;
            let user = store::users::find_by_id(&state.pool, local_id)
                .await?
                .ok_or(AppError::InconsistentMapping(iam_id))?;
            reconcile_profile(state, user, iam_user).await
        }
        Err(e) => {
            let _ = tx.rollback().await;
            Err(e)
        }
    }
}

async fn create_user_and_mapping(
    tx: &mut Transaction<'_, Postgres>,
    iam_id: i64,
    iam_user: &IamUser,
) -> AppResult<LocalUser> {
    let user = store::users::create(&mut **tx, &iam_user.email, &iam_user.name).await?;
    store::mappings::create_mapping(&mut **tx, iam_id, user.id).await?;
    Ok(user)
}

/// Overwrite mutable profile fields when they drifted from the issuer's
/// copy. A local update, never a new user.
async fn reconcile_profile(
    state: &AppState,
    user: LocalUser,
    iam_user: &IamUser,
) -> AppResult<LocalUser> {
    if user.email == iam_user.email && user.name == iam_user.name {
        return Ok(user);
    }
    debug!(user_id = user.id, "reconciling drifted profile fields");
    store::users::update_profile(&state.pool, user.id, &iam_user.email, &iam_user.name)
        .await?
        .ok_or(AppError::InconsistentMapping(iam_user.id.fold()))
}

/// Verify an access token and resolve it to a local user.
///
/// Fails closed: any verification error, missing mapping, or storage
/// failure yields `None`. Callers treat `None` uniformly as "not
/// authenticated".
pub async fn validate_access_token(state: &AppState, token: &str) -> Option<LocalUser> {
    let claims = jwt::verify_access_token(
        token,
        &state.config.token_issuer,
        state.config.token_secret.as_bytes(),
    )?;

    let iam_id = ExternalId::from_subject(&claims.sub).fold();
    let local_id = match store::mappings::find_local_id_by_issuer_id(&state.pool, iam_id).await {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            debug!(error = %e, "mapping lookup failed during validation");
            return None;
        }
    };
    match store::users::find_by_id(&state.pool, local_id).await {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, "user lookup failed during validation");
            None
        }
    }
}

/// The `/session` probe: cookie fast path, then the `X-User-ID` hint, then
/// invalid. Never errors.
pub async fn probe_session(
    state: &AppState,
    cookie_token: Option<&str>,
    user_hint: Option<i64>,
) -> SessionStatus {
    // Fast path: an unexpired access-token cookie needs no issuer round trip.
    if let Some(token) = cookie_token
        && let Some(user) = validate_access_token(state, token).await
    {
        return SessionStatus {
            valid: true,
            user: Some(user),
            access_token: None,
        };
    }

    let Some(local_id) = user_hint else {
        return SessionStatus::invalid();
    };

    match recover_session(state, local_id).await {
        Ok(status) => status,
        Err(e) => {
            debug!(user_id = local_id, error = %e, "session recovery failed");
            SessionStatus::invalid()
        }
    }
}

/// Recover a session from the stored refresh token after the access-token
/// cookie has expired: the issuer rules on the token, then a fresh access
/// token is minted locally from the mirrored profile.
async fn recover_session(state: &AppState, local_id: i64) -> AppResult<SessionStatus> {
    let Some(user) = store::users::find_by_id(&state.pool, local_id).await? else {
        return Ok(SessionStatus::invalid());
    };
    let Some(record) = store::refresh_tokens::find_by_user_id(&state.pool, local_id).await? else {
        return Ok(SessionStatus::invalid());
    };

    let validation = state.iam.validate_refresh_token(&record.token).await?;
    if !validation.valid {
        debug!(user_id = local_id, "issuer rejected stored refresh token");
        return Ok(SessionStatus::invalid());
    }

    let Some(iam_id) = store::mappings::find_issuer_id_by_local_id(&state.pool, local_id).await?
    else {
        return Ok(SessionStatus::invalid());
    };

    let access_token = jwt::generate_access_token(
        &iam_id.to_string(),
        &user.email,
        &user.name,
        &state.config.token_issuer,
        state.config.token_secret.as_bytes(),
    )?;

    info!(user_id = local_id, "session recovered from stored refresh token");
    Ok(SessionStatus {
        valid: true,
        user: Some(user),
        access_token: Some(access_token),
    })
}

/// Exchange the stored refresh token for a fresh access token.
///
/// Known-bad tokens (expired locally, rejected by the issuer) purge the
/// stored record; transient issuer faults leave local state untouched so the
/// caller can retry.
pub async fn renew_access_token(state: &AppState, local_id: i64) -> AppResult<RenewedSession> {
    let record = store::refresh_tokens::find_by_user_id(&state.pool, local_id)
        .await?
        .ok_or(AppError::NoActiveSession)?;

    let now = Utc::now();
    let embedded_expiry = jwt::decode_expiry_unverified(&record.token);
    if record.expires_at <= now || embedded_expiry.is_some_and(|exp| exp <= now) {
        store::refresh_tokens::delete(&state.pool, local_id).await?;
        info!(user_id = local_id, "purged expired refresh token");
        return Err(AppError::RefreshTokenExpired);
    }

    match state.iam.renew_tokens(&record.token).await {
        Ok(renewed) => {
            if renewed.refresh_token_updated {
                let expires_at = jwt::decode_expiry_unverified(&renewed.refresh_token)
                    .ok_or_else(|| {
                        AppError::InvalidResponse(
                            "rotated refresh token without readable expiry".into(),
                        )
                    })?;
                store::refresh_tokens::upsert(
                    &state.pool,
                    local_id,
                    &renewed.refresh_token,
                    expires_at,
                    None,
                )
                .await?;
                info!(user_id = local_id, "stored rotated refresh token");
            }
            Ok(RenewedSession {
                access_token: renewed.access_token,
                expires_in: renewed.expires_in,
                refresh_token_updated: renewed.refresh_token_updated,
            })
        }
        Err(AppError::RefreshTokenInvalid) => {
            // The issuer is authoritative; the local copy is now known-bad.
            store::refresh_tokens::delete(&state.pool, local_id).await?;
            Err(AppError::RefreshTokenInvalid)
        }
        Err(e) => Err(e),
    }
}

/// Delete the local session. Always succeeds locally; notifying the issuer
/// is best-effort and a failure is logged, not returned.
pub async fn logout(state: &AppState, user_hint: Option<i64>) -> AppResult<()> {
    let Some(local_id) = user_hint else {
        return Ok(());
    };
    let Some(record) = store::refresh_tokens::find_by_user_id(&state.pool, local_id).await? else {
        return Ok(());
    };

    store::refresh_tokens::delete(&state.pool, local_id).await?;

    if let Err(e) = state.iam.invalidate_tokens(&record.token).await {
        warn!(user_id = local_id, error = %e, "issuer logout notification failed");
    }

    info!(user_id = local_id, "logged out");
    Ok(())
}
