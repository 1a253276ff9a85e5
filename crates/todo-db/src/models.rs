//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! They never leave this crate; repositories hand out `todo-types` values.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use todo_types::{AuthIdentity, Role, User, UserId};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Auth identity row from the database
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRow {
    pub auth_id: String,
    pub provider: String,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> DbResult<Self> {
        Ok(Self {
            id: user_id_from_db(row.id)?,
            role: role_from_db(&row.role)?,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<IdentityRow> for AuthIdentity {
    type Error = DbError;

    fn try_from(row: IdentityRow) -> DbResult<Self> {
        Ok(Self {
            user_id: user_id_from_db(row.user_id)?,
            role: role_from_db(&row.role)?,
            auth_id: row.auth_id,
            provider: row.provider,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a batch of rows, failing on the first bad one
pub fn users_from_rows(rows: Vec<UserRow>) -> DbResult<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

pub fn identities_from_rows(rows: Vec<IdentityRow>) -> DbResult<Vec<AuthIdentity>> {
    rows.into_iter().map(AuthIdentity::try_from).collect()
}

/// Reject the nil identifier before it reaches a query
pub fn user_id_to_db(id: UserId) -> DbResult<Uuid> {
    if id.is_nil() {
        return Err(DbError::NilId);
    }
    Ok(id.0)
}

fn user_id_from_db(id: Uuid) -> DbResult<UserId> {
    if id.is_nil() {
        return Err(DbError::Corrupt("nil user id in row".to_string()));
    }
    Ok(UserId(id))
}

fn role_from_db(role: &str) -> DbResult<Role> {
    role.parse()
        .map_err(|e: todo_types::ParseRoleError| DbError::Corrupt(e.to_string()))
}
