use std::sync::{Arc, RwLock};

use tracing::debug;

/// Shared slot for the current bearer token.
///
/// Holds at most one opaque token string. Clones share the same slot, so a
/// token set through one handle is immediately visible to every dispatcher
/// holding another clone — headers are built from the live value at request
/// time, never cached. The token is treated as opaque: no shape validation,
/// no local expiry tracking (expiry is discovered via a rejected request).
///
/// Writes are last-write-wins; serializing concurrent login attempts is the
/// caller's responsibility.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing token unconditionally.
    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.inner.write().unwrap();
        *slot = Some(token.into());
        debug!(target: "token_store", "bearer token replaced");
    }

    /// Drop the current token. Subsequent requests go out unauthenticated.
    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap();
        *slot = None;
        debug!(target: "token_store", "bearer token cleared");
    }

    /// The live token, or `None` before first login / after a clear.
    pub fn current(&self) -> Option<String> {
        self.inner.read().unwrap().clone()
    }
}
