//! PostgreSQL identity repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use todo_types::{AuthIdentity, CreateIdentity, Role, UserId};

use crate::error::{DbError, DbResult};
use crate::models::{identities_from_rows, user_id_to_db, IdentityRow};
use crate::repo::IdentityRepository;

/// PostgreSQL identity repository
#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    /// Create a new identity repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn create(&self, identity: CreateIdentity) -> DbResult<AuthIdentity> {
        let user_id = user_id_to_db(identity.user_id)?;
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            INSERT INTO auth_identities (auth_id, provider, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING auth_id, provider, user_id, role, created_at, updated_at
            "#,
        )
        .bind(&identity.auth_id)
        .bind(&identity.provider)
        .bind(user_id)
        .bind(identity.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_by_auth_id(&self, auth_id: &str) -> DbResult<AuthIdentity> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT auth_id, provider, user_id, role, created_at, updated_at
            FROM auth_identities
            WHERE auth_id = $1
            "#,
        )
        .bind(auth_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }

    async fn list_by_user_id(&self, user_id: UserId) -> DbResult<Vec<AuthIdentity>> {
        let user_id = user_id_to_db(user_id)?;
        let rows = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT auth_id, provider, user_id, role, created_at, updated_at
            FROM auth_identities
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        identities_from_rows(rows)
    }

    async fn update_role(&self, auth_id: &str, role: Role) -> DbResult<AuthIdentity> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            UPDATE auth_identities
            SET role = $2, updated_at = GREATEST(now(), updated_at)
            WHERE auth_id = $1
            RETURNING auth_id, provider, user_id, role, created_at, updated_at
            "#,
        )
        .bind(auth_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }

    async fn delete_by_auth_id(&self, auth_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM auth_identities WHERE auth_id = $1")
            .bind(auth_id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(DbError::NotFound),
            n => Ok(n),
        }
    }
}
