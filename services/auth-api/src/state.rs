//! Application state

use std::ops::Deref;
use std::sync::Arc;

use todo_auth_core::AuthService;
use todo_cache::SharedStore;
use todo_db::pg::{PgIdentityRepository, PgUserRepository};
use todo_db::DbPool;

use crate::config::Config;

/// Type alias for the auth service with concrete repository types
pub type AuthServiceImpl = AuthService<PgUserRepository, PgIdentityRepository>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Login, logout and token validation
    pub auth: Arc<AuthServiceImpl>,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Cache backend (shared reference for health checks)
    pub cache: SharedStore,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl, pool: DbPool, cache: SharedStore, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            pool: SharedPool(Arc::new(pool)),
            cache,
            config: Arc::new(config),
        }
    }

    /// Lifetime of tokens this service mints, in seconds
    pub fn token_lifetime_secs(&self) -> u64 {
        self.config.auth.token.duration.as_secs()
    }
}
