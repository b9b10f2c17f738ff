//! Auth service configuration.

use std::env;
use std::str::FromStr;

use common::{AppError, AppResult, CacheConfig, DatabaseConfig, JwtConfig};

/// Auth service configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthServiceConfig {
    /// Token signing key and lifetimes
    pub jwt: JwtConfig,
    /// Redis connection and lookup-cache TTL
    pub cache: CacheConfig,
    /// Postgres credential store
    pub database: DatabaseConfig,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Everything has a development default except `JWT_SECRET`, which must
    /// be set and at least 32 characters long.
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let secret = env::var("JWT_SECRET")
            .or_else(|_| env::var("AUTH_SERVICE_JWT_SECRET"))
            .map_err(|_| AppError::validation("JWT_SECRET must be set (minimum 32 characters)"))?;

        let jwt = JwtConfig {
            secret,
            access_token_minutes: parsed("ACCESS_TOKEN_MINUTES", defaults.jwt.access_token_minutes)?,
            refresh_token_days: parsed("REFRESH_TOKEN_DAYS", defaults.jwt.refresh_token_days)?,
            email_token_minutes: parsed("EMAIL_TOKEN_MINUTES", defaults.jwt.email_token_minutes)?,
        };
        jwt.validate()?;

        let cache = CacheConfig {
            url: env::var("AUTH_SERVICE_REDIS_URL")
                .or_else(|_| env::var("REDIS_URL"))
                .unwrap_or(defaults.cache.url),
            user_ttl_seconds: parsed("USER_CACHE_TTL_SECONDS", defaults.cache.user_ttl_seconds)?,
        };

        let database = DatabaseConfig {
            url: env::var("AUTH_SERVICE_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .unwrap_or(defaults.database.url),
            max_connections: parsed("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections)?,
            min_connections: parsed("DATABASE_MIN_CONNECTIONS", defaults.database.min_connections)?,
        };

        Ok(Self {
            jwt,
            cache,
            database,
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset.
/// A value that is set but unparsable is an error rather than silently ignored.
fn parsed<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::validation(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_falls_back_when_unset() {
        let value: i64 = parsed("AUTH_SERVICE_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_default_lifetimes() {
        let config = AuthServiceConfig::default();
        assert_eq!(config.jwt.access_token_minutes, 15);
        assert_eq!(config.jwt.refresh_token_days, 7);
        assert_eq!(config.cache.user_ttl_seconds, 900);
    }
}
