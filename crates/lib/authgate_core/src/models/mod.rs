//! Shared domain and wire models.

pub mod auth;
pub mod contract;
