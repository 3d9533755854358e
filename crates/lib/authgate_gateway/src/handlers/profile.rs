//! Sample protected handler.

use axum::{Extension, Json};

use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserView;

/// `GET /profile` — returns the authenticated user's mirrored profile.
/// Demonstrates how arbitrary endpoints sit behind access-token validation.
pub async fn profile_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<UserView> {
    Json(user.into())
}
