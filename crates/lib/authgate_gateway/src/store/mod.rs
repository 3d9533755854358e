//! Database queries.

pub mod mappings;
pub mod refresh_tokens;
pub mod users;
