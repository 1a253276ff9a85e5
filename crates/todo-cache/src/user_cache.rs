//! Read-through/write-through cache of user records
//!
//! Records live under the by-id key. Email and external-id keys are
//! pointers holding the id string, resolved in two hops. List windows are
//! cached whole and evicted coarsely on any mutation.
//!
//! Every failure is absorbed here: reads degrade to a miss and writes are
//! logged, so the repository result always stands on its own.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use todo_types::{PageParams, User, UserId};

use crate::keys::UserKeys;
use crate::store::SharedStore;

/// Default lifetime of every user cache entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct UserCache {
    store: SharedStore,
    keys: UserKeys,
    ttl: Duration,
}

impl UserCache {
    pub fn new(store: SharedStore, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            keys: UserKeys::new(prefix),
            ttl,
        }
    }

    pub fn keys(&self) -> &UserKeys {
        &self.keys
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn put_by_id(&self, user: &User) {
        self.put_json(&self.keys.by_id(user.id), user).await;
    }

    pub async fn put_pointer_by_email(&self, email: &str, user_id: UserId) {
        self.put_raw(&self.keys.by_email(email), &user_id.to_string())
            .await;
    }

    pub async fn put_pointer_by_external_id(&self, auth_id: &str, user_id: UserId) {
        self.put_raw(&self.keys.by_auth_id(auth_id), &user_id.to_string())
            .await;
    }

    pub async fn put_page(&self, page: PageParams, users: &[User]) {
        self.put_json(&self.keys.page(page), users).await;
    }

    pub async fn get_by_id(&self, id: UserId) -> Option<User> {
        self.get_json(&self.keys.by_id(id)).await
    }

    pub async fn get_by_email(&self, email: &str) -> Option<User> {
        self.resolve_pointer(&self.keys.by_email(email)).await
    }

    pub async fn get_by_external_id(&self, auth_id: &str) -> Option<User> {
        self.resolve_pointer(&self.keys.by_auth_id(auth_id)).await
    }

    pub async fn get_page(&self, page: PageParams) -> Option<Vec<User>> {
        self.get_json(&self.keys.page(page)).await
    }

    /// Drop the by-id record and every pointer known to reference it
    pub async fn evict_user(&self, id: UserId, email: &str, external_ids: &[String]) {
        self.delete(&self.keys.by_id(id)).await;
        self.evict_email_pointer(email).await;
        for auth_id in external_ids {
            self.evict_external_id_pointer(auth_id).await;
        }
    }

    pub async fn evict_external_id_pointer(&self, auth_id: &str) {
        self.delete(&self.keys.by_auth_id(auth_id)).await;
    }

    pub async fn evict_email_pointer(&self, email: &str) {
        self.delete(&self.keys.by_email(email)).await;
    }

    /// Drop every cached list window
    pub async fn evict_pages(&self) {
        let prefix = self.keys.page_prefix();
        match self.store.delete_prefix(&prefix).await {
            Ok(n) => tracing::debug!(removed = n, "Evicted user pages"),
            Err(e) => tracing::warn!(error = %e, "Failed to evict user pages"),
        }
    }

    async fn resolve_pointer(&self, pointer: &str) -> Option<User> {
        let raw = self.get_raw(pointer).await?;

        let target = match UserId::parse(&raw) {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!(key = pointer, "Malformed user pointer, dropping it");
                self.delete(pointer).await;
                return None;
            }
        };

        match self.get_by_id(target).await {
            Some(user) => Some(user),
            None => {
                tracing::warn!(key = pointer, user_id = %target, "Dangling user pointer, dropping it");
                self.delete(pointer).await;
                None
            }
        }
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "User cache read failed");
                None
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Undecodable user cache entry, dropping it");
                self.delete(key).await;
                None
            }
        }
    }

    async fn put_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value, self.ttl).await {
            tracing::warn!(key, error = %e, "User cache write failed");
        }
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.put_raw(key, &raw).await,
            Err(e) => tracing::warn!(key, error = %e, "Failed to encode user cache entry"),
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "User cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::CacheStore;
    use chrono::Utc;
    use std::sync::Arc;
    use todo_types::{ManualClock, Role};

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            name: "Alice".to_string(),
            email: email.to_string(),
            role: Role::User,
            created_at: now,
            updated_at: now,
        }
    }

    fn cache() -> (Arc<ManualClock>, Arc<MemoryStore>, UserCache) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let cache = UserCache::new(store.clone(), "users", DEFAULT_TTL);
        (clock, store, cache)
    }

    #[tokio::test]
    async fn test_put_then_get_by_id() {
        let (_, _, cache) = cache();
        let u = user("a@x");
        cache.put_by_id(&u).await;
        assert_eq!(cache.get_by_id(u.id).await, Some(u));
    }

    #[tokio::test]
    async fn test_pointers_resolve_to_record() {
        let (_, _, cache) = cache();
        let u = user("a@x");
        cache.put_by_id(&u).await;
        cache.put_pointer_by_email(&u.email, u.id).await;
        cache.put_pointer_by_external_id("prov|a", u.id).await;

        assert_eq!(cache.get_by_email("a@x").await, Some(u.clone()));
        assert_eq!(cache.get_by_external_id("prov|a").await, Some(u));
    }

    #[tokio::test]
    async fn test_dangling_pointer_is_miss_and_removed() {
        let (_, store, cache) = cache();
        let u = user("a@x");
        cache.put_pointer_by_email(&u.email, u.id).await;

        assert_eq!(cache.get_by_email("a@x").await, None);
        assert!(!store.contains("users:email:a@x"));
    }

    #[tokio::test]
    async fn test_malformed_pointer_is_miss() {
        let (_, store, cache) = cache();
        store
            .set("users:email:a@x", "not-a-uuid", DEFAULT_TTL)
            .await
            .unwrap();
        assert_eq!(cache.get_by_email("a@x").await, None);
        assert!(!store.contains("users:email:a@x"));
    }

    #[tokio::test]
    async fn test_evict_user_drops_all_views() {
        let (_, store, cache) = cache();
        let u = user("a@x");
        cache.put_by_id(&u).await;
        cache.put_pointer_by_email(&u.email, u.id).await;
        cache.put_pointer_by_external_id("prov|a", u.id).await;

        cache
            .evict_user(u.id, &u.email, &["prov|a".to_string()])
            .await;

        assert!(store.is_empty());
        assert_eq!(cache.get_by_id(u.id).await, None);
    }

    #[tokio::test]
    async fn test_pages_round_trip_and_evict() {
        let (_, store, cache) = cache();
        let users = vec![user("a@x"), user("b@x")];
        let page = PageParams::new(2, 0);
        cache.put_page(page, &users).await;
        cache.put_by_id(&users[0]).await;

        assert_eq!(cache.get_page(page).await, Some(users.clone()));

        cache.evict_pages().await;
        assert_eq!(cache.get_page(page).await, None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let (clock, _, cache) = cache();
        let u = user("a@x");
        cache.put_by_id(&u).await;

        clock.advance(chrono::Duration::minutes(10));
        assert_eq!(cache.get_by_id(u.id).await, None);
    }
}
