//! Common test utilities for todo-auth-core integration tests

#![allow(dead_code)]

pub mod mock_repos;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use todo_auth_core::{AuthService, TokenCodec, TokenConfig, UserService};
use todo_cache::{CacheError, CacheResult, CacheStore, DenyList, MemoryStore, SharedStore, UserCache};
use todo_db::IdentityRepository;
use todo_types::{LoginParams, ManualClock};
use tokio_util::sync::CancellationToken;

#[allow(unused_imports)]
pub use mock_repos::{Fault, FaultyIdentityRepository, MockDb, MockIdentityRepository, MockUserRepository};

pub const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
pub const ISSUER: &str = "golang-todo-app";
pub const USER_PREFIX: &str = "users";
pub const DENY_PREFIX: &str = "blacklist";

/// Everything a test needs, wired the way the service wires it
pub struct Harness<I: IdentityRepository> {
    pub clock: Arc<ManualClock>,
    pub cache: Arc<MemoryStore>,
    pub db: Arc<MockDb>,
    pub identities: Arc<I>,
    pub auth: AuthService<MockUserRepository, I>,
}

impl<I: IdentityRepository> Harness<I> {
    pub fn users(&self) -> &UserService<MockUserRepository, I> {
        self.auth.users()
    }

    pub fn codec(&self) -> &TokenCodec {
        self.auth.codec()
    }
}

/// Harness over plain mocks and an in-memory cache
pub fn harness() -> Harness<MockIdentityRepository> {
    harness_with(MockIdentityRepository::new, None)
}

/// Harness with a custom identity repository and optionally a custom cache
/// backend. `cache` in the result is only wired in when `store` is `None`.
pub fn harness_with<I, F>(identities: F, store: Option<SharedStore>) -> Harness<I>
where
    I: IdentityRepository,
    F: FnOnce(Arc<MockDb>) -> I,
{
    let clock = Arc::new(ManualClock::new(
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    ));
    let memory = Arc::new(MemoryStore::new(clock.clone()));
    let fallback: SharedStore = memory.clone();
    let store = store.unwrap_or(fallback);
    let db = MockDb::new();

    let users = Arc::new(MockUserRepository::new(db.clone()));
    let identities = Arc::new(identities(db.clone()));
    let user_cache = UserCache::new(store.clone(), USER_PREFIX, Duration::from_secs(600));
    let user_service = Arc::new(UserService::new(users, identities.clone(), user_cache));

    let codec = TokenCodec::new(&TokenConfig::new(SECRET, ISSUER), clock.clone()).unwrap();
    let deny_list = DenyList::new(store, DENY_PREFIX);
    let auth = AuthService::new(user_service, identities.clone(), codec, deny_list, clock.clone());

    Harness {
        clock,
        cache: memory,
        db,
        identities,
        auth,
    }
}

pub fn alice() -> LoginParams {
    LoginParams {
        external_id: "prov|alice".to_string(),
        provider: "prov".to_string(),
        email: "alice@example.com".to_string(),
        name: "Alice".to_string(),
    }
}

pub fn live() -> CancellationToken {
    CancellationToken::new()
}

pub fn cancelled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}

/// Cache backend that is always down
pub struct DownStore;

#[async_trait]
impl CacheStore for DownStore {
    async fn get(&self, _: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _: &str, _: &str, _: Duration) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn delete(&self, _: &str) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn delete_prefix(&self, _: &str) -> CacheResult<u64> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}
