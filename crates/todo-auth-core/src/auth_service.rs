//! Auth service - login-or-register, logout and token validation

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use todo_cache::DenyList;
use todo_db::{DbError, IdentityRepository, UserRepository};
use todo_types::{CreateIdentity, CreateUser, LoginParams, SharedClock, TokenInfo, User};

use crate::cancel::guard;
use crate::token::{TokenCodec, TokenPayload};
use crate::user_service::UserService;
use crate::{AuthError, AuthResult};

/// A successful login
#[derive(Debug, Clone)]
pub struct Login {
    pub token: String,
    pub user: User,
}

/// How one pass through the registration flow ended
enum Attempt {
    Done(Login),
    /// Someone else registered the same external id in between
    LostRace,
}

/// Authentication service
///
/// Provides the login-or-register flow over users and identities, plus
/// token validation and revocation through the deny list.
pub struct AuthService<U: UserRepository, I: IdentityRepository> {
    users: Arc<UserService<U, I>>,
    identities: Arc<I>,
    codec: TokenCodec,
    deny_list: DenyList,
    clock: SharedClock,
}

impl<U: UserRepository, I: IdentityRepository> AuthService<U, I> {
    pub fn new(
        users: Arc<UserService<U, I>>,
        identities: Arc<I>,
        codec: TokenCodec,
        deny_list: DenyList,
        clock: SharedClock,
    ) -> Self {
        Self {
            users,
            identities,
            codec,
            deny_list,
            clock,
        }
    }

    pub fn users(&self) -> &UserService<U, I> {
        &self.users
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Recognise or provision the user behind an external identity and
    /// mint a token for it.
    ///
    /// If another request registers the same external id between our user
    /// insert and identity insert, our user is removed and the flow runs
    /// once more, which then finds the winner's identity.
    #[instrument(
        skip(self, cancel, params),
        fields(external_id = %params.external_id, provider = %params.provider)
    )]
    pub async fn login_or_register(
        &self,
        cancel: &CancellationToken,
        params: &LoginParams,
    ) -> AuthResult<Login> {
        if params.external_id.trim().is_empty() || params.provider.trim().is_empty() {
            return Err(AuthError::InvalidInput(
                "external_id and provider must not be empty".to_string(),
            ));
        }

        match self.attempt_login(cancel, params).await? {
            Attempt::Done(login) => return Ok(login),
            Attempt::LostRace => {
                tracing::warn!("Concurrent registration for external id, retrying once");
            }
        }

        match self.attempt_login(cancel, params).await? {
            Attempt::Done(login) => Ok(login),
            Attempt::LostRace => Err(AuthError::internal(
                "registration",
                "identity conflict persisted after retry",
            )),
        }
    }

    async fn attempt_login(
        &self,
        cancel: &CancellationToken,
        params: &LoginParams,
    ) -> AuthResult<Attempt> {
        match guard(cancel, self.identities.get_by_auth_id(&params.external_id)).await? {
            Ok(identity) => {
                let user = match self.users.get_by_id(cancel, identity.user_id).await {
                    Ok(user) => user,
                    Err(AuthError::NotFound) => {
                        return Err(AuthError::internal(
                            "login",
                            format!("identity points at missing user {}", identity.user_id),
                        ))
                    }
                    Err(e) => return Err(e),
                };
                return self.issue(user).map(Attempt::Done);
            }
            Err(DbError::NotFound) => {}
            Err(e) => return Err(AuthError::internal("identity lookup", e)),
        }

        let user = self
            .users
            .create(cancel, CreateUser::new(&params.name, &params.email))
            .await?;

        let identity = CreateIdentity {
            auth_id: params.external_id.clone(),
            provider: params.provider.clone(),
            user_id: user.id,
            role: user.role,
        };

        match guard(cancel, self.identities.create(identity)).await {
            Ok(Ok(_)) => {
                self.users
                    .remember_external_id(&params.external_id, user.id)
                    .await;
                tracing::info!(user_id = %user.id, "Registered new user");
                self.issue(user).map(Attempt::Done)
            }
            Ok(Err(DbError::UniqueViolation { .. })) => {
                self.compensate(&user).await;
                Ok(Attempt::LostRace)
            }
            Ok(Err(e)) => {
                self.compensate(&user).await;
                Err(AuthError::internal("identity insert", e))
            }
            // An identity row that did land goes with the user by cascade
            Err(cancelled) => {
                self.compensate(&user).await;
                Err(cancelled)
            }
        }
    }

    /// Best-effort removal of a user created by an abandoned registration.
    ///
    /// Runs under its own token; the caller's may already have fired.
    async fn compensate(&self, user: &User) {
        let uncancelled = CancellationToken::new();
        if let Err(e) = self.users.delete(&uncancelled, user.id).await {
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                "Could not remove user from abandoned registration"
            );
        }
    }

    fn issue(&self, user: User) -> AuthResult<Login> {
        let token = self.codec.mint(TokenPayload {
            user_id: user.id,
            role: user.role,
        })?;
        Ok(Login { token, user })
    }

    /// Revoke `token` until it would have expired anyway.
    ///
    /// An already expired token is accepted without doing anything.
    #[instrument(skip_all)]
    pub async fn logout(&self, cancel: &CancellationToken, token: &str) -> AuthResult<()> {
        let claims = match self.codec.parse(token) {
            Ok(claims) => claims,
            Err(AuthError::ExpiredToken) => {
                tracing::debug!("Logout with expired token, nothing to revoke");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let remaining = claims.expires_at - self.clock.now();
        let ttl = match remaining.to_std() {
            Ok(ttl) if !ttl.is_zero() => ttl,
            _ => return Ok(()),
        };

        match guard(cancel, self.deny_list.revoke(&claims.jti, ttl)).await? {
            Ok(()) => Ok(()),
            Err(e) => Err(AuthError::internal("token revocation", e)),
        }
    }

    /// Check `token` and return who it speaks for.
    ///
    /// The user is not reloaded: role changes take effect on next login.
    #[instrument(skip_all)]
    pub async fn validate_token(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> AuthResult<TokenInfo> {
        let claims = self.codec.parse(token)?;

        if guard(cancel, self.deny_list.is_revoked(&claims.jti)).await? {
            tracing::debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(AuthError::Revoked);
        }

        Ok(TokenInfo {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}
