//! External identity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Role, UserId};

/// Link between an identity provider principal and an internal user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    /// Opaque principal name issued by the provider (primary key)
    pub auth_id: String,
    /// Provider tag, e.g. `google-oauth2`
    pub provider: String,
    pub user_id: UserId,
    /// Provider-asserted role; the user record stays authoritative
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIdentity {
    pub auth_id: String,
    pub provider: String,
    pub user_id: UserId,
    #[serde(default)]
    pub role: Role,
}

/// Login-or-register input, already vouched for by a trusted upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginParams {
    pub external_id: String,
    pub provider: String,
    pub email: String,
    pub name: String,
}

/// What a validated token tells the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub user_id: UserId,
    pub role: Role,
}
