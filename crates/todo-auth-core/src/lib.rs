//! Todo Auth Core - Authentication business logic
//!
//! Core authentication functionality for the todo backend:
//! - Login-or-register over external identities
//! - HS256 bearer tokens with a deny list for logout
//! - A user service that keeps the user cache consistent with the repository
//!
//! Every operation takes a [`CancellationToken`](tokio_util::sync::CancellationToken);
//! cancelling it aborts pending repository and cache calls.

pub mod auth_service;
pub mod cancel;
pub mod config;
pub mod crypto;
pub mod error;
pub mod token;
pub mod user_service;

pub use auth_service::{AuthService, Login};
pub use config::{AuthConfig, CacheConfig, ConfigError, RepositoryConfig, TokenConfig};
pub use crypto::{KeyError, SigningKey};
pub use error::{AuthError, AuthResult};
pub use token::{CodecError, TokenClaims, TokenCodec, TokenPayload, WireClaims};
pub use user_service::UserService;
