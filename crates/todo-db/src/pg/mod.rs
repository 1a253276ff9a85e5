//! PostgreSQL repository implementations

mod identity;
mod user;

pub use identity::PgIdentityRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub identities: PgIdentityRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            identities: PgIdentityRepository::new(pool),
        }
    }
}
