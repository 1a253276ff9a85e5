//! Mock repositories for testing
//!
//! Both repositories share one [`MockDb`] so that the same uniqueness,
//! foreign key and cascade rules as the Postgres schema apply.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use todo_db::{DbError, DbResult, IdentityRepository, NewUser, UserRepository};
use todo_types::{AuthIdentity, CreateIdentity, PageParams, Role, UpdateUser, User, UserId};
use tokio_util::sync::CancellationToken;

/// Shared in-memory tables
#[derive(Default)]
pub struct MockDb {
    users: DashMap<UserId, User>,
    by_email: DashMap<String, UserId>,
    identities: DashMap<String, AuthIdentity>,
    /// Serialises multi-map mutations
    write_lock: Mutex<()>,
    pub user_reads: AtomicUsize,
    pub user_lists: AtomicUsize,
}

impl MockDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    pub fn identity(&self, auth_id: &str) -> Option<AuthIdentity> {
        self.identities.get(auth_id).map(|r| r.value().clone())
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|r| r.value().clone())
    }

    pub fn user_reads(&self) -> usize {
        self.user_reads.load(Ordering::SeqCst)
    }

    pub fn user_lists(&self) -> usize {
        self.user_lists.load(Ordering::SeqCst)
    }

    /// Insert a user directly, bypassing every service
    pub fn seed_user(&self, name: &str, email: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());
        user
    }

    /// Insert an identity directly, bypassing every service
    pub fn seed_identity(&self, auth_id: &str, provider: &str, user_id: UserId) -> AuthIdentity {
        let now = Utc::now();
        let identity = AuthIdentity {
            auth_id: auth_id.to_string(),
            provider: provider.to_string(),
            user_id,
            role: Role::User,
            created_at: now,
            updated_at: now,
        };
        self.identities
            .insert(identity.auth_id.clone(), identity.clone());
        identity
    }

    fn unique_violation(constraint: &str) -> DbError {
        DbError::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }
}

/// In-memory user repository for testing
#[derive(Clone)]
pub struct MockUserRepository {
    db: Arc<MockDb>,
}

impl MockUserRepository {
    pub fn new(db: Arc<MockDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, user: NewUser) -> DbResult<User> {
        if user.id.is_nil() {
            return Err(DbError::NilId);
        }
        let _guard = self.db.write_lock.lock().unwrap();
        match self.db.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(MockDb::unique_violation("users_email_key")),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        let now = Utc::now();
        let user = User {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        self.db.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<User> {
        if id.is_nil() {
            return Err(DbError::NilId);
        }
        self.db.user_reads.fetch_add(1, Ordering::SeqCst);
        self.db.user(id).ok_or(DbError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> DbResult<User> {
        self.db.user_reads.fetch_add(1, Ordering::SeqCst);
        let id = self
            .db
            .by_email
            .get(email)
            .map(|r| *r.value())
            .ok_or(DbError::NotFound)?;
        self.db.user(id).ok_or(DbError::NotFound)
    }

    async fn list(&self, page: PageParams) -> DbResult<Vec<User>> {
        self.db.user_lists.fetch_add(1, Ordering::SeqCst);
        let mut users: Vec<User> = self.db.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| (a.created_at, a.id.0).cmp(&(b.created_at, b.id.0)));
        Ok(users
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn update(&self, update: &UpdateUser) -> DbResult<User> {
        if update.id.is_nil() {
            return Err(DbError::NilId);
        }
        let _guard = self.db.write_lock.lock().unwrap();
        let mut user = self.db.user(update.id).ok_or(DbError::NotFound)?;

        if let Some(email) = &update.email {
            if *email != user.email {
                match self.db.by_email.entry(email.clone()) {
                    Entry::Occupied(_) => return Err(MockDb::unique_violation("users_email_key")),
                    Entry::Vacant(slot) => {
                        slot.insert(user.id);
                    }
                }
                self.db.by_email.remove(&user.email);
                user.email = email.clone();
            }
        }
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now().max(user.updated_at);

        self.db.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> DbResult<u64> {
        if id.is_nil() {
            return Err(DbError::NilId);
        }
        let _guard = self.db.write_lock.lock().unwrap();
        let (_, user) = self.db.users.remove(&id).ok_or(DbError::NotFound)?;
        self.db.by_email.remove(&user.email);
        // ON DELETE CASCADE
        self.db.identities.retain(|_, identity| identity.user_id != id);
        Ok(1)
    }
}

/// In-memory identity repository for testing
#[derive(Clone)]
pub struct MockIdentityRepository {
    db: Arc<MockDb>,
}

impl MockIdentityRepository {
    pub fn new(db: Arc<MockDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityRepository for MockIdentityRepository {
    async fn create(&self, identity: CreateIdentity) -> DbResult<AuthIdentity> {
        if identity.user_id.is_nil() {
            return Err(DbError::NilId);
        }
        let _guard = self.db.write_lock.lock().unwrap();
        if !self.db.users.contains_key(&identity.user_id) {
            return Err(DbError::Corrupt("foreign key violation".to_string()));
        }
        let now = Utc::now();
        match self.db.identities.entry(identity.auth_id.clone()) {
            Entry::Occupied(_) => Err(MockDb::unique_violation("auth_identities_pkey")),
            Entry::Vacant(slot) => {
                let row = AuthIdentity {
                    auth_id: identity.auth_id,
                    provider: identity.provider,
                    user_id: identity.user_id,
                    role: identity.role,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(row.clone());
                Ok(row)
            }
        }
    }

    async fn get_by_auth_id(&self, auth_id: &str) -> DbResult<AuthIdentity> {
        self.db.identity(auth_id).ok_or(DbError::NotFound)
    }

    async fn list_by_user_id(&self, user_id: UserId) -> DbResult<Vec<AuthIdentity>> {
        Ok(self
            .db
            .identities
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn update_role(&self, auth_id: &str, role: Role) -> DbResult<AuthIdentity> {
        let mut identity = self.db.identities.get_mut(auth_id).ok_or(DbError::NotFound)?;
        identity.role = role;
        identity.updated_at = Utc::now().max(identity.updated_at);
        Ok(identity.clone())
    }

    async fn delete_by_auth_id(&self, auth_id: &str) -> DbResult<u64> {
        self.db
            .identities
            .remove(auth_id)
            .map(|_| 1)
            .ok_or(DbError::NotFound)
    }
}

/// What a [`FaultyIdentityRepository`] does on `create`
#[derive(Clone)]
pub enum Fault {
    /// Another request registers the external id for `winner` just before
    /// our insert, which then conflicts. Happens once.
    LoseRaceTo(UserId),
    /// Every insert conflicts without any identity becoming visible
    AlwaysConflict,
    /// Every insert fails with a non-constraint error
    Broken,
    /// The first insert cancels the token and never completes; later
    /// inserts go through
    CancelInFlight(CancellationToken),
}

/// Identity repository that injects a fault on `create`
pub struct FaultyIdentityRepository {
    inner: MockIdentityRepository,
    db: Arc<MockDb>,
    fault: Fault,
    pub creates: AtomicUsize,
}

impl FaultyIdentityRepository {
    pub fn new(db: Arc<MockDb>, fault: Fault) -> Self {
        Self {
            inner: MockIdentityRepository::new(db.clone()),
            db,
            fault,
            creates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityRepository for FaultyIdentityRepository {
    async fn create(&self, identity: CreateIdentity) -> DbResult<AuthIdentity> {
        let attempt = self.creates.fetch_add(1, Ordering::SeqCst);
        match &self.fault {
            Fault::LoseRaceTo(winner) if attempt == 0 => {
                self.db
                    .seed_identity(&identity.auth_id, &identity.provider, *winner);
                Err(MockDb::unique_violation("auth_identities_pkey"))
            }
            Fault::LoseRaceTo(_) => self.inner.create(identity).await,
            Fault::AlwaysConflict => Err(MockDb::unique_violation("auth_identities_pkey")),
            Fault::Broken => Err(DbError::Corrupt("disk on fire".to_string())),
            Fault::CancelInFlight(cancel) if attempt == 0 => {
                cancel.cancel();
                std::future::pending().await
            }
            Fault::CancelInFlight(_) => self.inner.create(identity).await,
        }
    }

    async fn get_by_auth_id(&self, auth_id: &str) -> DbResult<AuthIdentity> {
        self.inner.get_by_auth_id(auth_id).await
    }

    async fn list_by_user_id(&self, user_id: UserId) -> DbResult<Vec<AuthIdentity>> {
        self.inner.list_by_user_id(user_id).await
    }

    async fn update_role(&self, auth_id: &str, role: Role) -> DbResult<AuthIdentity> {
        self.inner.update_role(auth_id, role).await
    }

    async fn delete_by_auth_id(&self, auth_id: &str) -> DbResult<u64> {
        self.inner.delete_by_auth_id(auth_id).await
    }
}
