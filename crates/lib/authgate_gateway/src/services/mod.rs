//! Service-layer flows over the stores and the issuer client.

pub mod cookies;
pub mod session;
