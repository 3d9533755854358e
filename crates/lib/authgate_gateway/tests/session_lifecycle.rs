//! Gateway session lifecycle against a stub issuer speaking the real wire
//! contract with real signed tokens.
//!
//! Requires PostgreSQL: point `DATABASE_URL` at an admin connection; each
//! test creates a scratch database. Skipped when `DATABASE_URL` is unset.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use authgate_core::auth::jwt;
use authgate_core::identity::ExternalId;
use authgate_core::models::contract::{
    AuthenticateRequest, AuthenticateResponse, IamUser, InvalidateTokensResponse,
    RefreshTokenRequest, RenewTokensResponse, ValidateRefreshResponse,
};
use authgate_gateway::config::GatewayConfig;
use authgate_gateway::{AppState, store};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use rand::Rng;
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";
const ISSUER: &str = "authgate";

/// The one seeded issuer identity.
const IAM_USER_ID: i64 = 7;
const EMAIL: &str = "a@x.com";
const PASSWORD: &str = "secret";
const NAME: &str = "Ada";

// ---------------------------------------------------------------------------
// Stub issuer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct IamStub {
    /// When set, renewals rotate the refresh token (simulates the renewal
    /// window having been reached).
    rotate: AtomicBool,
    invalidate_calls: AtomicU32,
}

fn iam_user() -> IamUser {
    IamUser {
        id: ExternalId::Numeric(IAM_USER_ID),
        email: EMAIL.into(),
        name: NAME.into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn stub_authenticate(Json(body): Json<AuthenticateRequest>) -> Response {
    if body.email != EMAIL || body.password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"message": "Invalid credentials"})),
        )
            .into_response();
    }
    let subject = IAM_USER_ID.to_string();
    let access_token =
        jwt::generate_access_token(&subject, EMAIL, NAME, ISSUER, SECRET.as_bytes()).unwrap();
    let refresh_token =
        jwt::generate_refresh_token(&subject, ISSUER, SECRET.as_bytes()).unwrap();
    Json(AuthenticateResponse {
        user: iam_user(),
        access_token,
        refresh_token,
        expires_in: jwt::ACCESS_TOKEN_EXPIRY_SECS,
    })
    .into_response()
}

async fn stub_validate(Json(body): Json<RefreshTokenRequest>) -> Json<ValidateRefreshResponse> {
    let resp = match jwt::verify_refresh_token(&body.refresh_token, ISSUER, SECRET.as_bytes()) {
        Ok(claims) => ValidateRefreshResponse {
            valid: true,
            payload: Some(authgate_core::models::contract::RefreshTokenPayload {
                user_id: ExternalId::from_subject(&claims.sub),
                expires_at: chrono::DateTime::from_timestamp(claims.exp, 0).unwrap(),
            }),
        },
        Err(_) => ValidateRefreshResponse {
            valid: false,
            payload: None,
        },
    };
    Json(resp)
}

async fn stub_renew(
    State(stub): State<Arc<IamStub>>,
    Json(body): Json<RefreshTokenRequest>,
) -> Response {
    let claims = match jwt::verify_refresh_token(&body.refresh_token, ISSUER, SECRET.as_bytes()) {
        Ok(claims) => claims,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "Invalid refresh token"})),
            )
                .into_response();
        }
    };
    let access_token =
        jwt::generate_access_token(&claims.sub, EMAIL, NAME, ISSUER, SECRET.as_bytes()).unwrap();
    let rotate = stub.rotate.load(Ordering::SeqCst);
    let refresh_token = if rotate {
        jwt::generate_refresh_token(&claims.sub, ISSUER, SECRET.as_bytes()).unwrap()
    } else {
        body.refresh_token.clone()
    };
    Json(RenewTokensResponse {
        access_token,
        refresh_token,
        expires_in: jwt::ACCESS_TOKEN_EXPIRY_SECS,
        refresh_token_updated: rotate,
    })
    .into_response()
}

async fn stub_invalidate(State(stub): State<Arc<IamStub>>) -> Json<InvalidateTokensResponse> {
    stub.invalidate_calls.fetch_add(1, Ordering::SeqCst);
    Json(InvalidateTokensResponse { invalidated: true })
}

async fn spawn_stub_iam() -> (Arc<IamStub>, String) {
    let stub = Arc::new(IamStub::default());
    let app = Router::new()
        .route("/api/v1/users/authenticate", post(stub_authenticate))
        .route("/api/v1/users/validate-refresh-token", post(stub_validate))
        .route("/api/v1/users/renew-tokens", post(stub_renew))
        .route("/api/v1/users/invalidate-tokens", post(stub_invalidate))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub issuer");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    (stub, format!("http://{addr}/api/v1"))
}

// ---------------------------------------------------------------------------
// Gateway under test
// ---------------------------------------------------------------------------

async fn scratch_pool() -> Option<sqlx::PgPool> {
    let Ok(admin_url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };
    let admin = sqlx::PgPool::connect(&admin_url)
        .await
        .expect("connect admin database");
    let db_name = format!("authgate_gw_test_{:08x}", rand::rng().random::<u32>());
    sqlx::query(&format!("CREATE DATABASE {db_name}"))
        .execute(&admin)
        .await
        .expect("create scratch database");

    let mut url = url::Url::parse(&admin_url).expect("parse DATABASE_URL");
    url.set_path(&db_name);
    let pool = sqlx::PgPool::connect(url.as_str())
        .await
        .expect("connect scratch database");
    authgate_gateway::migrate(&pool).await.expect("migrate");
    Some(pool)
}

fn gateway_state(pool: sqlx::PgPool, iam_base_url: String) -> AppState {
    AppState::new(
        pool,
        GatewayConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            iam_base_url,
            iam_timeout_secs: 2,
            token_secret: SECRET.into(),
            token_issuer: ISSUER.into(),
            cookie_secure: false,
        },
    )
    .expect("build state")
}

struct TestResponse {
    status: StatusCode,
    set_cookies: Vec<String>,
    body: serde_json::Value,
}

async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let set_cookies = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    TestResponse {
        status,
        set_cookies,
        body,
    }
}

async fn login(app: &Router) -> TestResponse {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({"email": EMAIL, "password": PASSWORD}).to_string(),
        ))
        .unwrap();
    send(app, req).await
}

async fn refresh_row_count(pool: &sqlx::PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM refresh_tokens")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_mirrors_identity_and_sets_cookie() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool.clone(), iam_url));

    let resp = login(&app).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["email"], EMAIL);
    assert_eq!(resp.body["expires_in"], 120);
    assert!(resp.body["user"]["createdAt"].is_string());
    assert!(
        resp.body.get("refresh_token").is_none(),
        "refresh token never reaches the browser"
    );

    let cookie = resp
        .set_cookies
        .iter()
        .find(|c| c.starts_with("access_token="))
        .expect("access-token cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=120"));

    // Decoded expiry sits ~120s ahead of issue time.
    let access = resp.body["access_token"].as_str().unwrap();
    let exp = jwt::decode_expiry_unverified(access).expect("readable expiry");
    let ahead = exp.timestamp() - Utc::now().timestamp();
    assert!((110..=130).contains(&ahead), "unexpected expiry: {ahead}s");

    // Exactly one local user, one mapping, one session row.
    assert_eq!(refresh_row_count(&pool).await, 1);
    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);

    // A second login replaces, never appends.
    let resp = login(&app).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(refresh_row_count(&pool).await, 1);
    let mappings = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM iam_user_mappings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mappings, 1);

    // Either side of the 1:1 mapping now counts as taken.
    let local_id = resp.body["user"]["id"].as_i64().unwrap();
    assert!(store::mappings::mapping_exists(&pool, IAM_USER_ID, 999).await.unwrap());
    assert!(store::mappings::mapping_exists(&pool, 999, local_id).await.unwrap());
    assert!(!store::mappings::mapping_exists(&pool, 999, 999).await.unwrap());
    assert!(
        store::mappings::create_mapping(&pool, IAM_USER_ID, local_id)
            .await
            .is_err(),
        "duplicate mapping never creates a second row"
    );
}

#[tokio::test]
async fn login_reconciles_drifted_profile_fields() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool.clone(), iam_url));

    let logged_in = login(&app).await;
    let user_id = logged_in.body["user"]["id"].as_i64().unwrap();

    // Simulate a mirror that drifted from the issuer's copy.
    sqlx::query("UPDATE users SET name = 'Stale', email = 'stale@x.com' WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let resp = login(&app).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["id"], user_id, "same local user, not a new one");
    assert_eq!(resp.body["user"]["name"], NAME);
    assert_eq!(resp.body["user"]["email"], EMAIL);
}

#[tokio::test]
async fn bad_credentials_propagate_as_generic_401() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({"email": EMAIL, "password": "wrong"}).to_string(),
        ))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Invalid email or password");
}

#[tokio::test]
async fn issuer_outage_is_a_503_not_a_credential_failure() {
    let Some(pool) = scratch_pool().await else { return };
    // Nothing listens here; connections are refused.
    let app = authgate_gateway::router(gateway_state(
        pool,
        "http://127.0.0.1:9/api/v1".to_string(),
    ));

    let resp = login(&app).await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn validate_resolves_the_login_user() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let logged_in = login(&app).await;
    let access = logged_in.body["access_token"].as_str().unwrap();
    let user_id = logged_in.body["user"]["id"].as_i64().unwrap();

    let req = Request::builder()
        .uri("/api/v1/auth/validate")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["valid"], true);
    assert_eq!(resp.body["user"]["id"], user_id);

    let req = Request::builder()
        .uri("/api/v1/auth/validate")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_sits_behind_token_validation() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let req = Request::builder()
        .uri("/api/v1/profile")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status, StatusCode::UNAUTHORIZED);

    let logged_in = login(&app).await;
    let access = logged_in.body["access_token"].as_str().unwrap();
    let req = Request::builder()
        .uri("/api/v1/profile")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["email"], EMAIL);
}

#[tokio::test]
async fn session_probe_without_signals_is_invalid_200() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let req = Request::builder()
        .uri("/api/v1/auth/session")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["valid"], false);
    assert!(resp.body.get("user").is_none());
}

#[tokio::test]
async fn session_probe_recovers_from_the_user_hint() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let logged_in = login(&app).await;
    let user_id = logged_in.body["user"]["id"].as_i64().unwrap();

    // No cookie, only the hint: the stored refresh token drives recovery.
    let req = Request::builder()
        .uri("/api/v1/auth/session")
        .header("X-User-ID", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["valid"], true);
    assert_eq!(resp.body["user"]["id"], user_id);

    let minted = resp.body["access_token"].as_str().expect("fresh token");
    assert!(
        jwt::verify_access_token(minted, ISSUER, SECRET.as_bytes()).is_some(),
        "probe-minted token verifies"
    );
    assert!(
        resp.set_cookies
            .iter()
            .any(|c| c.starts_with("access_token=")),
        "probe refreshes the cookie"
    );
}

#[tokio::test]
async fn session_probe_with_valid_cookie_skips_the_issuer() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let logged_in = login(&app).await;
    let access = logged_in.body["access_token"].as_str().unwrap();

    let req = Request::builder()
        .uri("/api/v1/auth/session")
        .header(header::COOKIE, format!("access_token={access}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["valid"], true);
    assert!(
        resp.body.get("access_token").is_none(),
        "fast path mints nothing"
    );
}

#[tokio::test]
async fn renewal_without_a_stored_token_requires_login() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool, iam_url));

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/renew-token")
        .header("X-User-ID", "999")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["requires_login"], true);

    // Missing hint is also a 401, without the relogin flag.
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/renew-token")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "User ID required");
}

#[tokio::test]
async fn renewal_updates_cookie_and_respects_rotation_signal() {
    let Some(pool) = scratch_pool().await else { return };
    let (stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool.clone(), iam_url));

    let logged_in = login(&app).await;
    let user_id = logged_in.body["user"]["id"].as_i64().unwrap();
    let stored_before =
        sqlx::query_scalar::<_, String>("SELECT token FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();

    // Outside the renewal window: same stored token.
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/renew-token")
        .header("X-User-ID", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["refresh_token_updated"], false);
    assert!(resp.set_cookies.iter().any(|c| c.starts_with("access_token=")));
    let stored_after =
        sqlx::query_scalar::<_, String>("SELECT token FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored_before, stored_after);

    // Rotation signaled: the stored copy is overwritten.
    stub.rotate.store(true, Ordering::SeqCst);
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/renew-token")
        .header("X-User-ID", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["refresh_token_updated"], true);
    let stored_rotated =
        sqlx::query_scalar::<_, String>("SELECT token FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_ne!(stored_rotated, stored_after);
}

#[tokio::test]
async fn expired_stored_token_is_purged_on_renewal() {
    let Some(pool) = scratch_pool().await else { return };
    let (_stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool.clone(), iam_url));

    let logged_in = login(&app).await;
    let user_id = logged_in.body["user"]["id"].as_i64().unwrap();

    // Replace the stored token with one two hours past expiry.
    let expired = jwt::generate_refresh_token_with_ttl(
        &IAM_USER_ID.to_string(),
        ISSUER,
        SECRET.as_bytes(),
        -7200,
    )
    .unwrap();
    let expires_at = jwt::decode_expiry_unverified(&expired).unwrap();
    store::refresh_tokens::upsert(&pool, user_id, &expired, expires_at, None)
        .await
        .unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/renew-token")
        .header("X-User-ID", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Refresh token expired");
    assert_eq!(resp.body["requires_login"], true);
    assert_eq!(refresh_row_count(&pool).await, 0, "stale record purged");
}

#[tokio::test]
async fn logout_purges_the_session_and_notifies_the_issuer() {
    let Some(pool) = scratch_pool().await else { return };
    let (stub, iam_url) = spawn_stub_iam().await;
    let app = authgate_gateway::router(gateway_state(pool.clone(), iam_url));

    let logged_in = login(&app).await;
    let user_id = logged_in.body["user"]["id"].as_i64().unwrap();
    assert_eq!(refresh_row_count(&pool).await, 1);

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .header("X-User-ID", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(refresh_row_count(&pool).await, 0);
    assert_eq!(stub.invalidate_calls.load(Ordering::SeqCst), 1);
    assert!(
        resp.set_cookies
            .iter()
            .any(|c| c.starts_with("access_token=;") && c.contains("Max-Age=0")),
        "cookie cleared"
    );

    // Logging out twice is harmless.
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .header("X-User-ID", user_id.to_string())
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status, StatusCode::OK);
}
