//! Request bodies for the user-management endpoints.
//!
//! Token-endpoint payloads are the shared wire contract in
//! `authgate_core::models::contract`.

use serde::Deserialize;

/// `POST /users` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// `PUT /users/{id}` request body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}
