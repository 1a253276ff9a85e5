//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use todo_types::{PageParams, UpdateUser, User, UserId};

use crate::error::{DbError, DbResult};
use crate::models::{user_id_to_db, users_from_rows, UserRow};
use crate::repo::{NewUser, UserRepository};

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> DbResult<User> {
        let id = user_id_to_db(user.id)?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<User> {
        let id = user_id_to_db(id)?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }

    async fn get_by_email(&self, email: &str) -> DbResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }

    async fn list(&self, page: PageParams) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at, updated_at
            FROM users
            ORDER BY created_at, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await?;

        users_from_rows(rows)
    }

    async fn update(&self, update: &UpdateUser) -> DbResult<User> {
        let id = user_id_to_db(update.id)?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = GREATEST(now(), updated_at)
            WHERE id = $1
            RETURNING id, name, email, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }

    async fn delete(&self, id: UserId) -> DbResult<u64> {
        let id = user_id_to_db(id)?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(DbError::NotFound),
            n => Ok(n),
        }
    }
}
