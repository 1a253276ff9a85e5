//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[source] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Insert or update would break a uniqueness constraint
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// The nil UUID was passed where a real identifier is required
    #[error("nil identifier")]
    NilId,

    /// A stored value could not be mapped onto the domain model
    #[error("invalid stored value: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Self::UniqueViolation {
                constraint: db.constraint().unwrap_or_default().to_string(),
            },
            other => Self::Sqlx(other),
        }
    }
}

/// Result alias for repository calls
pub type DbResult<T> = Result<T, DbError>;
