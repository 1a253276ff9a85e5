//! Cache substrate capability

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// String key/value store with per-entry expiry.
///
/// Implementations must be safe for concurrent use; callers share one
/// instance behind an `Arc`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value for `key`, or `None` when absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, evictable once `ttl` has elapsed
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Remove every key starting with `prefix`, returning how many went
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Round-trip to the backend
    async fn ping(&self) -> CacheResult<()>;
}

pub type SharedStore = Arc<dyn CacheStore>;
