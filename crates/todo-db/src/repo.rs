//! Repository traits
//!
//! Define async repository interfaces for database operations. Every method
//! speaks domain types; row models stay inside this crate.

use async_trait::async_trait;
use todo_types::{AuthIdentity, CreateIdentity, PageParams, Role, UpdateUser, User, UserId};

use crate::error::DbResult;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A taken email yields `DbError::UniqueViolation`.
    async fn create(&self, user: NewUser) -> DbResult<User>;

    /// Find a user by ID, `DbError::NotFound` if absent
    async fn get_by_id(&self, id: UserId) -> DbResult<User>;

    /// Find a user by email, `DbError::NotFound` if absent
    async fn get_by_email(&self, email: &str) -> DbResult<User>;

    /// List users ordered by creation time
    async fn list(&self, page: PageParams) -> DbResult<Vec<User>>;

    /// Apply the present fields and return the post-update record
    async fn update(&self, update: &UpdateUser) -> DbResult<User>;

    /// Delete a user and, by cascade, its identities. Returns the number of
    /// rows removed; zero is reported as `DbError::NotFound`.
    async fn delete(&self, id: UserId) -> DbResult<u64>;
}

/// Create user input, with the id already assigned
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Identity repository trait
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert an identity. A taken `auth_id` yields `DbError::UniqueViolation`.
    async fn create(&self, identity: CreateIdentity) -> DbResult<AuthIdentity>;

    /// Find an identity by its provider principal
    async fn get_by_auth_id(&self, auth_id: &str) -> DbResult<AuthIdentity>;

    /// All identities linked to a user
    async fn list_by_user_id(&self, user_id: UserId) -> DbResult<Vec<AuthIdentity>>;

    /// Change the provider-asserted role and return the updated identity
    async fn update_role(&self, auth_id: &str, role: Role) -> DbResult<AuthIdentity>;

    /// Remove one identity; zero rows is `DbError::NotFound`
    async fn delete_by_auth_id(&self, auth_id: &str) -> DbResult<u64>;
}
