//! Auth errors

use thiserror::Error;

/// Errors surfaced by the auth core.
///
/// Storage and cache errors never cross this boundary; anything that is not
/// one of the named kinds becomes [`AuthError::Internal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Entity not present
    #[error("not found")]
    NotFound,

    /// Another user already holds this email
    #[error("email already exists")]
    EmailExists,

    /// Caller-supplied input is structurally wrong
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid token (malformed, bad signature, etc.)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    ExpiredToken,

    /// Token is on the deny list
    #[error("token revoked")]
    Revoked,

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::EmailExists => 409,
            Self::InvalidInput(_) => 400,
            Self::InvalidToken | Self::ExpiredToken | Self::Revoked => 401,
            // Client closed request
            Self::Cancelled => 499,
            Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::EmailExists => "EMAIL_EXISTS",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ExpiredToken => "TOKEN_EXPIRED",
            Self::Revoked => "TOKEN_REVOKED",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Mask an unexpected failure, logging the underlying cause
    pub(crate) fn internal(context: &'static str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{context} failed");
        Self::Internal(format!("{context} failed"))
    }
}

impl From<todo_types::ParseRoleError> for AuthError {
    fn from(err: todo_types::ParseRoleError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
