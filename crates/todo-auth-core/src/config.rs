//! Configuration types for the auth core
//!
//! Values come from the environment. [`AuthConfig::from_lookup`] takes any
//! key lookup so tests can feed a map instead.

use std::time::Duration;

use crate::crypto::SigningKey;

/// Token signing configuration
#[derive(Clone)]
pub struct TokenConfig {
    /// HS256 secret, at least 32 bytes
    pub secret: String,
    /// Lifetime of a minted token
    pub duration: Duration,
    /// `iss` claim stamped on and required of every token
    pub issuer: String,
}

impl TokenConfig {
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(60 * 60);

    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            duration: Self::DEFAULT_DURATION,
            issuer: issuer.into(),
        }
    }

    /// Set token lifetime
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("duration", &self.duration)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Cache namespaces and lifetimes
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub user_prefix: String,
    pub user_ttl: Duration,
    pub deny_prefix: String,
}

impl CacheConfig {
    pub const DEFAULT_USER_TTL: Duration = Duration::from_secs(10 * 60);

    pub fn new(user_prefix: impl Into<String>, deny_prefix: impl Into<String>) -> Self {
        Self {
            user_prefix: user_prefix.into(),
            user_ttl: Self::DEFAULT_USER_TTL,
            deny_prefix: deny_prefix.into(),
        }
    }

    /// Set user cache entry lifetime
    pub fn with_user_ttl(mut self, ttl: Duration) -> Self {
        self.user_ttl = ttl;
        self
    }
}

/// Repository connection pool bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub min_conns: u32,
    pub max_conns: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            min_conns: 1,
            max_conns: 10,
        }
    }
}

impl From<RepositoryConfig> for todo_db::PoolOptions {
    fn from(config: RepositoryConfig) -> Self {
        Self {
            min_conns: config.min_conns,
            max_conns: config.max_conns,
        }
    }
}

/// Auth core configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token: TokenConfig,
    pub cache: CacheConfig,
    pub repository: RepositoryConfig,
}

impl AuthConfig {
    pub fn new(token: TokenConfig, cache: CacheConfig) -> Self {
        Self {
            token,
            cache,
            repository: RepositoryConfig::default(),
        }
    }

    /// Set pool bounds
    pub fn with_repository(mut self, repository: RepositoryConfig) -> Self {
        self.repository = repository;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        // Token
        let secret = required("TOKEN_SECRET")?;
        if secret.len() < SigningKey::MIN_KEY_LENGTH {
            return Err(ConfigError::Invalid("TOKEN_SECRET must be at least 32 bytes"));
        }
        let issuer = required("TOKEN_ISSUER")?;
        let duration = secs_or(&lookup, "TOKEN_DURATION_SECS", TokenConfig::DEFAULT_DURATION)?;

        // Cache
        let user_prefix = required("USER_CACHE_PREFIX")?;
        let deny_prefix = required("DENY_CACHE_PREFIX")?;
        let user_ttl = secs_or(&lookup, "USER_CACHE_TTL_SECS", CacheConfig::DEFAULT_USER_TTL)?;

        // Repository
        let defaults = RepositoryConfig::default();
        let max_conns = parse_or(&lookup, "POSTGRES_POOL_MAX_CONN", defaults.max_conns)?;
        let min_conns = parse_or(&lookup, "POSTGRES_POOL_MIN_CONN", defaults.min_conns)?;
        if max_conns == 0 {
            return Err(ConfigError::Invalid("POSTGRES_POOL_MAX_CONN"));
        }
        if min_conns > max_conns {
            return Err(ConfigError::Invalid(
                "POSTGRES_POOL_MIN_CONN must not exceed POSTGRES_POOL_MAX_CONN",
            ));
        }

        Ok(Self {
            token: TokenConfig::new(secret, issuer).with_duration(duration),
            cache: CacheConfig::new(user_prefix, deny_prefix).with_user_ttl(user_ttl),
            repository: RepositoryConfig {
                min_conns,
                max_conns,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_or(lookup, key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid(key));
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TOKEN_SECRET", "0123456789abcdef0123456789abcdef"),
            ("TOKEN_ISSUER", "golang-todo-app"),
            ("USER_CACHE_PREFIX", "users"),
            ("DENY_CACHE_PREFIX", "blacklist"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_lookup(env(&minimal())).unwrap();
        assert_eq!(config.token.duration, Duration::from_secs(3600));
        assert_eq!(config.token.issuer, "golang-todo-app");
        assert_eq!(config.cache.user_ttl, Duration::from_secs(600));
        assert_eq!(config.cache.deny_prefix, "blacklist");
        assert_eq!(config.repository, RepositoryConfig::default());
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("TOKEN_DURATION_SECS", "900"),
            ("USER_CACHE_TTL_SECS", "30"),
            ("POSTGRES_POOL_MAX_CONN", "20"),
            ("POSTGRES_POOL_MIN_CONN", "5"),
        ]);
        let config = AuthConfig::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.token.duration, Duration::from_secs(900));
        assert_eq!(config.cache.user_ttl, Duration::from_secs(30));
        assert_eq!(
            config.repository,
            RepositoryConfig {
                min_conns: 5,
                max_conns: 20
            }
        );
    }

    #[test]
    fn test_missing_required() {
        let vars: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "TOKEN_ISSUER")
            .collect();
        assert_eq!(
            AuthConfig::from_lookup(env(&vars)).unwrap_err(),
            ConfigError::Missing("TOKEN_ISSUER")
        );
    }

    #[test]
    fn test_short_secret() {
        let mut vars = minimal();
        vars[0] = ("TOKEN_SECRET", "too-short");
        assert!(matches!(
            AuthConfig::from_lookup(env(&vars)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_invalid_numbers() {
        for (key, value) in [
            ("TOKEN_DURATION_SECS", "0"),
            ("TOKEN_DURATION_SECS", "soon"),
            ("USER_CACHE_TTL_SECS", "-1"),
            ("POSTGRES_POOL_MAX_CONN", "0"),
        ] {
            let mut vars = minimal();
            vars.push((key, value));
            assert!(
                AuthConfig::from_lookup(env(&vars)).is_err(),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_min_above_max() {
        let mut vars = minimal();
        vars.extend([("POSTGRES_POOL_MAX_CONN", "2"), ("POSTGRES_POOL_MIN_CONN", "3")]);
        assert!(matches!(
            AuthConfig::from_lookup(env(&vars)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = TokenConfig::new("super-secret-value-that-is-long-enough", "iss");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
