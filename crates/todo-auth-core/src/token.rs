//! Bearer token codec
//!
//! Tokens are compact HS256 JWTs. The algorithm is fixed: a token declaring
//! anything else is rejected before its claims are looked at.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use todo_types::{Role, SharedClock, UserId};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::crypto::{KeyError, SigningKey};
use crate::AuthError;

/// Claim set as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireClaims {
    pub sub: String,
    pub role: String,
    pub iss: String,
    /// Seconds since epoch
    pub iat: i64,
    /// Seconds since epoch
    pub exp: i64,
    pub jti: String,
}

/// What a token is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPayload {
    pub user_id: UserId,
    pub role: Role,
}

/// Decoded and verified claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub role: Role,
    pub jti: String,
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Reasons a [`TokenCodec`] cannot be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("token lifetime must be greater than zero")]
    ZeroLifetime,
}

/// Mints and verifies bearer tokens
#[derive(Clone)]
pub struct TokenCodec {
    key: SigningKey,
    issuer: String,
    duration: std::time::Duration,
    validation: Validation,
    clock: SharedClock,
}

impl TokenCodec {
    /// # Errors
    /// Fails if the secret is shorter than [`SigningKey::MIN_KEY_LENGTH`] or
    /// the configured lifetime is zero.
    pub fn new(config: &TokenConfig, clock: SharedClock) -> Result<Self, CodecError> {
        if config.duration.as_secs() == 0 {
            return Err(CodecError::ZeroLifetime);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        // Expiry is judged against the injected clock in `parse`
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            key: SigningKey::new(&config.secret)?,
            issuer: config.issuer.clone(),
            duration: config.duration,
            validation,
            clock,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `payload` with a fresh `jti`, valid from now for the
    /// configured duration
    pub fn mint(&self, payload: TokenPayload) -> Result<String, AuthError> {
        let now = self.clock.now();
        let lifetime =
            Duration::from_std(self.duration).map_err(|e| AuthError::internal("token lifetime", e))?;
        let exp = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AuthError::Internal("token expiry overflows".to_string()))?;

        self.encode(&WireClaims {
            sub: payload.user_id.to_string(),
            role: payload.role.as_str().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Sign an arbitrary claim set
    pub fn encode(&self, claims: &WireClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, self.key.encoding())
            .map_err(|e| AuthError::internal("token signing", e))
    }

    /// Verify `token` and decode its claims.
    ///
    /// Structural defects, a foreign algorithm, a bad signature, a different
    /// issuer or unreadable claims are [`AuthError::InvalidToken`]. A token
    /// with `exp <= now` is [`AuthError::ExpiredToken`].
    pub fn parse(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<WireClaims>(token, self.key.decoding(), &self.validation).map_err(
            |e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => tracing::debug!("Token signature mismatch"),
                    ErrorKind::InvalidIssuer => tracing::debug!("Token from foreign issuer"),
                    other => tracing::debug!(error = ?other, "Token rejected"),
                }
                AuthError::InvalidToken
            },
        )?;

        let claims = TokenClaims::try_from(data.claims)?;
        if self.clock.now() >= claims.expires_at {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl TryFrom<WireClaims> for TokenClaims {
    type Error = AuthError;

    fn try_from(wire: WireClaims) -> Result<Self, AuthError> {
        let user_id = UserId::parse(&wire.sub).map_err(|_| AuthError::InvalidToken)?;
        if user_id.is_nil() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Self {
            user_id,
            role: wire.role.parse().map_err(|_| AuthError::InvalidToken)?,
            jti: wire.jti,
            issuer: wire.iss,
            issued_at: from_epoch_secs(wire.iat)?,
            expires_at: from_epoch_secs(wire.exp)?,
        })
    }
}

fn from_epoch_secs(secs: i64) -> Result<DateTime<Utc>, AuthError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(AuthError::InvalidToken)
}
