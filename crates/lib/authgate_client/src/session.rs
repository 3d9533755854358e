//! Explicit session context shared between the HTTP client and the renewal
//! agent.
//!
//! There is deliberately no implicit global "current user": the context is
//! an owned handle with a set/get/clear contract, cloned into whatever needs
//! to read the logged-in identity.

use std::sync::{Arc, RwLock};

use crate::api::SessionUser;

/// Shared handle to the logged-in user, if any.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionContext {
    pub fn set(&self, user: SessionUser) {
        *self.inner.write().unwrap() = Some(user);
    }

    pub fn get(&self) -> Option<SessionUser> {
        self.inner.read().unwrap().clone()
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap() = None;
    }
}
