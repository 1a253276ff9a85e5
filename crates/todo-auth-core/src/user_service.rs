//! User service - repository access behind the user cache
//!
//! Reads go through the cache and fall back to the repository, writing the
//! result back. Mutations hit the repository first and only touch the cache
//! once it succeeded.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use todo_cache::UserCache;
use todo_db::{DbError, IdentityRepository, NewUser, UserRepository};
use todo_types::{AuthIdentity, CreateUser, PageParams, Role, UpdateUser, User, UserId};

use crate::cancel::guard;
use crate::{AuthError, AuthResult};

pub struct UserService<U: UserRepository, I: IdentityRepository> {
    users: Arc<U>,
    identities: Arc<I>,
    cache: UserCache,
}

impl<U: UserRepository, I: IdentityRepository> UserService<U, I> {
    pub fn new(users: Arc<U>, identities: Arc<I>, cache: UserCache) -> Self {
        Self {
            users,
            identities,
            cache,
        }
    }

    /// Insert a user and seed every cache view of it
    #[instrument(skip(self, cancel, params), fields(email = %params.email))]
    pub async fn create(&self, cancel: &CancellationToken, params: CreateUser) -> AuthResult<User> {
        require_non_empty("name", &params.name)?;
        require_non_empty("email", &params.email)?;

        let new_user = NewUser {
            id: UserId::new(),
            name: params.name,
            email: params.email,
            role: params.role,
        };

        let user = match guard(cancel, self.users.create(new_user)).await? {
            Ok(user) => user,
            Err(DbError::UniqueViolation { .. }) => return Err(AuthError::EmailExists),
            Err(e) => return Err(AuthError::internal("user insert", e)),
        };

        self.cache.put_by_id(&user).await;
        self.cache.put_pointer_by_email(&user.email, user.id).await;
        if let Some(auth_id) = &params.external_id {
            self.cache.put_pointer_by_external_id(auth_id, user.id).await;
        }
        self.cache.evict_pages().await;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self, cancel))]
    pub async fn get_by_id(&self, cancel: &CancellationToken, id: UserId) -> AuthResult<User> {
        if let Some(user) = guard(cancel, self.cache.get_by_id(id)).await? {
            tracing::debug!("User cache hit");
            return Ok(user);
        }
        tracing::warn!(user_id = %id, "User cache miss, reading repository");

        let user = match guard(cancel, self.users.get_by_id(id)).await? {
            Ok(user) => user,
            Err(e) => return Err(lookup_error("user lookup by id", e)),
        };

        self.cache.put_by_id(&user).await;
        Ok(user)
    }

    #[instrument(skip(self, cancel))]
    pub async fn get_by_email(&self, cancel: &CancellationToken, email: &str) -> AuthResult<User> {
        if let Some(user) = guard(cancel, self.cache.get_by_email(email)).await? {
            tracing::debug!("User cache hit");
            return Ok(user);
        }
        tracing::warn!(email, "User cache miss, reading repository");

        let user = match guard(cancel, self.users.get_by_email(email)).await? {
            Ok(user) => user,
            Err(e) => return Err(lookup_error("user lookup by email", e)),
        };

        self.cache.put_by_id(&user).await;
        self.cache.put_pointer_by_email(&user.email, user.id).await;
        Ok(user)
    }

    /// Resolve the user behind a provider principal
    #[instrument(skip(self, cancel))]
    pub async fn get_by_external_id(
        &self,
        cancel: &CancellationToken,
        auth_id: &str,
    ) -> AuthResult<User> {
        if let Some(user) = guard(cancel, self.cache.get_by_external_id(auth_id)).await? {
            tracing::debug!("User cache hit");
            return Ok(user);
        }
        tracing::warn!(auth_id, "User cache miss, reading repository");

        let identity = match guard(cancel, self.identities.get_by_auth_id(auth_id)).await? {
            Ok(identity) => identity,
            Err(e) => return Err(lookup_error("identity lookup", e)),
        };
        let user = match guard(cancel, self.users.get_by_id(identity.user_id)).await? {
            Ok(user) => user,
            Err(e) => return Err(lookup_error("user lookup by id", e)),
        };

        self.cache.put_by_id(&user).await;
        self.cache.put_pointer_by_external_id(auth_id, user.id).await;
        Ok(user)
    }

    /// One window of users. `limit = 0` is an empty page and touches nothing.
    #[instrument(skip(self, cancel))]
    pub async fn get_page(
        &self,
        cancel: &CancellationToken,
        page: PageParams,
    ) -> AuthResult<Vec<User>> {
        if page.limit > PageParams::MAX_LIMIT {
            return Err(AuthError::InvalidInput(format!(
                "limit must not exceed {}",
                PageParams::MAX_LIMIT
            )));
        }
        if page.limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(users) = guard(cancel, self.cache.get_page(page)).await? {
            tracing::debug!("User page cache hit");
            return Ok(users);
        }
        tracing::warn!("User page cache miss, reading repository");

        let users = match guard(cancel, self.users.list(page)).await? {
            Ok(users) => users,
            Err(e) => return Err(AuthError::internal("user listing", e)),
        };

        self.cache.put_page(page, &users).await;
        Ok(users)
    }

    /// Apply a partial update and refresh every cache view of the user
    #[instrument(skip(self, cancel, update), fields(user_id = %update.id))]
    pub async fn update(&self, cancel: &CancellationToken, update: &UpdateUser) -> AuthResult<User> {
        if let Some(name) = &update.name {
            require_non_empty("name", name)?;
        }
        if let Some(email) = &update.email {
            require_non_empty("email", email)?;
        }

        let before = self.get_by_id(cancel, update.id).await?;

        let after = match guard(cancel, self.users.update(update)).await? {
            Ok(user) => user,
            Err(DbError::UniqueViolation { .. }) => return Err(AuthError::EmailExists),
            Err(e) => return Err(lookup_error("user update", e)),
        };

        self.cache.put_by_id(&after).await;
        if before.email != after.email {
            self.cache.evict_email_pointer(&before.email).await;
        }
        self.cache.put_pointer_by_email(&after.email, after.id).await;
        self.cache.evict_pages().await;

        tracing::info!("User updated");
        Ok(after)
    }

    /// Delete a user and forget every cache view of it
    #[instrument(skip(self, cancel))]
    pub async fn delete(&self, cancel: &CancellationToken, id: UserId) -> AuthResult<()> {
        let user = self.get_by_id(cancel, id).await?;

        // Identities go with the user by cascade, so collect their pointers first
        let external_ids = match guard(cancel, self.identities.list_by_user_id(id)).await? {
            Ok(identities) => identities.into_iter().map(|i| i.auth_id).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list identities, leaving their pointers to expire");
                Vec::new()
            }
        };

        match guard(cancel, self.users.delete(id)).await? {
            Ok(_) => {}
            Err(e) => return Err(lookup_error("user delete", e)),
        }

        self.cache.evict_user(id, &user.email, &external_ids).await;
        self.cache.evict_pages().await;

        tracing::info!("User deleted");
        Ok(())
    }

    /// Change the role the provider asserted for `auth_id`.
    ///
    /// The user record keeps its own role; tokens keep being minted from it.
    #[instrument(skip(self, cancel))]
    pub async fn set_identity_role(
        &self,
        cancel: &CancellationToken,
        auth_id: &str,
        role: Role,
    ) -> AuthResult<AuthIdentity> {
        require_non_empty("auth_id", auth_id)?;

        match guard(cancel, self.identities.update_role(auth_id, role)).await? {
            Ok(identity) => Ok(identity),
            Err(e) => Err(lookup_error("identity role update", e)),
        }
    }

    /// Detach an external identity from its user. The user stays.
    #[instrument(skip(self, cancel))]
    pub async fn unlink_identity(&self, cancel: &CancellationToken, auth_id: &str) -> AuthResult<()> {
        require_non_empty("auth_id", auth_id)?;

        match guard(cancel, self.identities.delete_by_auth_id(auth_id)).await? {
            Ok(_) => {}
            Err(e) => return Err(lookup_error("identity delete", e)),
        }

        self.cache.evict_external_id_pointer(auth_id).await;
        tracing::info!("Identity unlinked");
        Ok(())
    }

    /// Record the external-id pointer once the identity is durable
    pub async fn remember_external_id(&self, auth_id: &str, user_id: UserId) {
        self.cache.put_pointer_by_external_id(auth_id, user_id).await;
    }
}

fn require_non_empty(field: &str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

/// `NotFound` passes through, everything else is masked
fn lookup_error(context: &'static str, err: DbError) -> AuthError {
    match err {
        DbError::NotFound => AuthError::NotFound,
        other => AuthError::internal(context, other),
    }
}
