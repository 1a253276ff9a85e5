//! In-process cache store
//!
//! Entries expire against the injected clock, so tests can move time
//! forward without sleeping.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use todo_types::{SharedClock, SystemClock};

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    clock: SharedClock,
}

impl MemoryStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .is_some_and(|e| e.expires_at > now)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(std::sync::Arc::new(SystemClock))
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, e| e.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| CacheError::Backend(format!("ttl out of range: {ttl:?}")))?;
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| CacheError::Backend("expiry overflows".to_string()))?;

        // Write-once keys (deny-list jtis) are never read back, so sweep here
        self.entries.retain(|_, e| e.expires_at > now);
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(prefix));
        Ok((before - self.entries.len()) as u64)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
