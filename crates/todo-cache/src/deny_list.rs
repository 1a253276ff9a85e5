//! Revoked token ids
//!
//! An optimistic channel: tokens expire on their own, so a lost revocation
//! only means the token lives until its `exp`. Lookups fail open.

use std::time::Duration;

use crate::error::CacheResult;
use crate::keys::deny_key;
use crate::store::SharedStore;

const MARKER: &str = "true";

#[derive(Clone)]
pub struct DenyList {
    store: SharedStore,
    prefix: String,
}

impl DenyList {
    pub fn new(store: SharedStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Mark `jti` revoked for at least `ttl`. Idempotent; a zero `ttl` is a
    /// no-op.
    pub async fn revoke(&self, jti: &str, ttl: Duration) -> CacheResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        self.store
            .set(&deny_key(&self.prefix, jti), MARKER, ttl)
            .await?;
        tracing::info!(jti, ttl_secs = ttl.as_secs(), "Token revoked");
        Ok(())
    }

    /// Whether `jti` is on the list. Backend errors answer `false`.
    pub async fn is_revoked(&self, jti: &str) -> bool {
        match self.store.get(&deny_key(&self.prefix, jti)).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(jti, error = %e, "Deny list lookup failed, treating token as live");
                false
            }
        }
    }
}
