//! Signed token issue and validation.
//!
//! Tokens are HS256 JWTs. Each carries a scope and a random `jti`, so two
//! tokens issued in the same second for the same user still differ.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult, JwtConfig};
use domain::{TokenScope, User, TOKEN_TYPE_BEARER};

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub scope: TokenScope,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    /// Remaining lifetime, used as the cache TTL of its `jti`.
    pub fn ttl(&self) -> std::time::Duration {
        let secs = (self.claims.exp - self.claims.iat).max(0) as u64;
        std::time::Duration::from_secs(secs)
    }

    pub fn jti(&self) -> String {
        self.claims.jti.to_string()
    }
}

/// Token pair returned after authentication or refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Token type (always "bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access: &IssuedToken, refresh: &IssuedToken) -> Self {
        Self {
            access_token: access.token.clone(),
            refresh_token: refresh.token.clone(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: access.claims.exp - access.claims.iat,
        }
    }
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_minutes: i64,
    refresh_days: i64,
    email_minutes: i64,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret_bytes()),
            decoding: DecodingKey::from_secret(config.secret_bytes()),
            access_minutes: config.access_token_minutes,
            refresh_days: config.refresh_token_days,
            email_minutes: config.email_token_minutes,
        }
    }

    /// Configured lifetime of tokens with the given scope.
    pub fn lifetime(&self, scope: TokenScope) -> AppResult<Duration> {
        let lifetime = match scope {
            TokenScope::AccessToken => Duration::try_minutes(self.access_minutes),
            TokenScope::RefreshToken => Duration::try_days(self.refresh_days),
            TokenScope::ConfirmEmail | TokenScope::ResetPassword => {
                Duration::try_minutes(self.email_minutes)
            }
        };
        lifetime
            .ok_or_else(|| AppError::internal(format!("Lifetime of {} is out of range", scope)))
    }

    /// Sign a token for `user` with the scope's configured lifetime.
    pub fn issue(&self, user: &User, scope: TokenScope) -> AppResult<IssuedToken> {
        self.issue_with_lifetime(user, scope, self.lifetime(scope)?)
    }

    pub fn issue_with_lifetime(
        &self,
        user: &User,
        scope: TokenScope,
        lifetime: Duration,
    ) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AppError::internal(format!("Expiry of {} token overflows", scope)))?;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            scope,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("Token signing failed: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry, then require the expected scope.
    pub fn decode(&self, token: &str, expected: TokenScope) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.scope != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.scope,
                "Token scope mismatch"
            );
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&JwtConfig::with_secret("k".repeat(40)).unwrap())
    }

    fn user() -> User {
        User::new(Uuid::new_v4(), "a@x.com".to_string(), "hash".to_string())
    }

    #[test]
    fn test_issue_and_decode() {
        let codec = codec();
        let user = user();
        let issued = codec.issue(&user, TokenScope::AccessToken).unwrap();

        let claims = codec.decode(&issued.token, TokenScope::AccessToken).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, user.id);
        assert_eq!(issued.ttl(), std::time::Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_tokens_are_unique() {
        let codec = codec();
        let user = user();
        let a = codec.issue(&user, TokenScope::RefreshToken).unwrap();
        let b = codec.issue(&user, TokenScope::RefreshToken).unwrap();
        assert_ne!(a.token, b.token);
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_wrong_scope_rejected() {
        let codec = codec();
        let issued = codec.issue(&user(), TokenScope::RefreshToken).unwrap();
        let result = codec.decode(&issued.token, TokenScope::AccessToken);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec();
        let issued = codec.issue(&user(), TokenScope::AccessToken).unwrap();
        let sig_start = issued.token.rfind('.').unwrap() + 1;
        let first = issued.token.as_bytes()[sig_start];
        let mut tampered = issued.token.clone();
        tampered.replace_range(
            sig_start..sig_start + 1,
            if first == b'A' { "B" } else { "A" },
        );

        let result = codec.decode(&tampered, TokenScope::AccessToken);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let issued = codec().issue(&user(), TokenScope::AccessToken).unwrap();
        let other = TokenCodec::new(&JwtConfig::with_secret("z".repeat(40)).unwrap());
        let result = other.decode(&issued.token, TokenScope::AccessToken);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let issued = codec
            .issue_with_lifetime(&user(), TokenScope::AccessToken, Duration::seconds(-10))
            .unwrap();
        let result = codec.decode(&issued.token, TokenScope::AccessToken);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        let result = codec().decode("not-a-jwt", TokenScope::AccessToken);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_pair_reports_access_lifetime() {
        let codec = codec();
        let user = user();
        let access = codec.issue(&user, TokenScope::AccessToken).unwrap();
        let refresh = codec.issue(&user, TokenScope::RefreshToken).unwrap();
        let pair = TokenPair::new(&access, &refresh);

        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 15 * 60);
    }

    #[test]
    fn test_unrepresentable_lifetime_is_an_error() {
        let mut config = JwtConfig::with_secret("k".repeat(40)).unwrap();
        config.refresh_token_days = 100_000_000;
        config.access_token_minutes = i64::MAX;
        let codec = TokenCodec::new(&config);
        let user = user();

        let result = codec.issue(&user, TokenScope::RefreshToken);
        assert!(matches!(result, Err(AppError::Internal(_))));
        let result = codec.issue(&user, TokenScope::AccessToken);
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(codec.issue(&user, TokenScope::ConfirmEmail).is_ok());
    }
}
