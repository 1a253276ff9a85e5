//! Common error types

use thiserror::Error;

/// A role string that is neither `user` nor `admin`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct ParseRoleError(pub String);
