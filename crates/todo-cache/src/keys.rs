//! Cache key grammar
//!
//! ```text
//! <prefix>:<uuid>                       user record
//! <prefix>:email:<email>                pointer to a user id
//! <prefix>:auth:<auth_id>               pointer to a user id
//! <prefix>:page:limit=<n>:offset=<m>    list window
//! <deny-prefix>:<jti>                   revoked token marker
//! ```
//!
//! The layout is shared by every deployment pointed at the same cache.

use todo_types::{PageParams, UserId};

/// Key builder for one user cache namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKeys {
    prefix: String,
}

impl UserKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn by_id(&self, id: UserId) -> String {
        format!("{}:{}", self.prefix, id)
    }

    pub fn by_email(&self, email: &str) -> String {
        format!("{}:email:{}", self.prefix, email)
    }

    pub fn by_auth_id(&self, auth_id: &str) -> String {
        format!("{}:auth:{}", self.prefix, auth_id)
    }

    pub fn page(&self, page: PageParams) -> String {
        format!(
            "{}limit={}:offset={}",
            self.page_prefix(),
            page.limit,
            page.offset
        )
    }

    /// Common prefix of every page key in this namespace
    pub fn page_prefix(&self) -> String {
        format!("{}:page:", self.prefix)
    }
}

pub fn deny_key(prefix: &str, jti: &str) -> String {
    format!("{prefix}:{jti}")
}
