//! Authentication service - registration, login, token lifecycle.
//!
//! Liveness of every stateful token lives in the cache: a token is accepted
//! only while its `jti` is the value stored under `token:{sub}:{slot}`. Any
//! cache error is returned to the caller; nothing here falls back to
//! "allow".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::{get_json, put_json, token_key, user_key, CacheStore};
use crate::repository::UserRepository;
use crate::service::tokens::{Claims, IssuedToken, TokenCodec, TokenPair};
use common::{AppError, AppResult, JwtConfig, OptionExt, DEFAULT_USER_CACHE_TTL_SECONDS};
use domain::{Password, Registration, TokenScope, User};

/// Outcome of asking for a new email confirmation token
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "token", rename_all = "snake_case")]
pub enum VerificationRequest {
    AlreadyVerified,
    Issued(String),
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new, unverified user
    async fn register(&self, email: String, password: String) -> AppResult<User>;

    /// Issue an email confirmation token for an unverified account
    async fn request_verification(&self, email: &str) -> AppResult<VerificationRequest>;

    /// Confirm an email address with a `confirm_email` token
    async fn verify_email(&self, token: &str) -> AppResult<()>;

    /// Check credentials and issue an access/refresh pair
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<TokenPair>;

    /// Rotate a refresh token into a new pair. Each refresh token works once.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Resolve the user behind a live access token
    async fn current_user(&self, access_token: &str) -> AppResult<User>;

    /// Revoke the session behind a live access token
    async fn logout(&self, access_token: &str) -> AppResult<()>;

    /// Issue a single-use password reset token. Unknown emails yield `None`.
    async fn request_password_reset(&self, email: &str) -> AppResult<Option<String>>;

    /// Consume a reset token and replace the password
    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
    tokens: TokenCodec,
    user_cache_ttl: Duration,
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        jwt: &JwtConfig,
    ) -> Self {
        Self {
            users,
            cache,
            tokens: TokenCodec::new(jwt),
            user_cache_ttl: Duration::from_secs(DEFAULT_USER_CACHE_TTL_SECONDS),
        }
    }

    /// Override how long authenticated-user lookups stay cached.
    pub fn with_user_cache_ttl(mut self, ttl: Duration) -> Self {
        self.user_cache_ttl = ttl;
        self
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Sign an access/refresh pair and record both as the subject's live
    /// tokens, replacing any previous session.
    ///
    /// The two slots are written separately. Concurrent logins for one user
    /// can interleave so that each caller ends up holding one live token
    /// and one that the other call overwrote; the loser simply logs in again.
    async fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let access = self.tokens.issue(user, TokenScope::AccessToken)?;
        let refresh = self.tokens.issue(user, TokenScope::RefreshToken)?;

        self.remember(&access).await?;
        self.remember(&refresh).await?;

        Ok(TokenPair::new(&access, &refresh))
    }

    async fn remember(&self, issued: &IssuedToken) -> AppResult<()> {
        let key = slot_key(issued.claims.sub, issued.claims.scope)?;
        self.cache.put(&key, &issued.jti(), issued.ttl()).await
    }

    /// Decode an access token and require it to be the subject's live one.
    async fn authorize(&self, access_token: &str) -> AppResult<Claims> {
        let claims = self.tokens.decode(access_token, TokenScope::AccessToken)?;
        let key = slot_key(claims.sub, TokenScope::AccessToken)?;

        match self.cache.get(&key).await? {
            Some(jti) if jti == claims.jti.to_string() => Ok(claims),
            _ => {
                tracing::debug!(user_id = %claims.sub, "Access token is not live");
                Err(AppError::InvalidToken)
            }
        }
    }

    async fn revoke_sessions(&self, user_id: Uuid) -> AppResult<()> {
        self.cache
            .invalidate(&slot_key(user_id, TokenScope::AccessToken)?)
            .await?;
        self.cache
            .invalidate(&slot_key(user_id, TokenScope::RefreshToken)?)
            .await?;
        self.cache.invalidate(&user_key(user_id)).await
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, email: String, password: String) -> AppResult<User> {
        let registration = Registration::new(email, password);
        registration.check()?;

        if self
            .users
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateUser);
        }

        let password = hash_password(registration.password).await?;
        let user = User::new(Uuid::new_v4(), registration.email, password.into_string());

        // The store's unique index settles concurrent registrations.
        let user = self.users.insert(user).await?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    async fn request_verification(&self, email: &str) -> AppResult<VerificationRequest> {
        let user = self.users.find_by_email(email).await?.ok_or_not_found()?;
        if user.is_verified {
            return Ok(VerificationRequest::AlreadyVerified);
        }

        let issued = self.tokens.issue(&user, TokenScope::ConfirmEmail)?;
        tracing::debug!(user_id = %user.id, "Confirmation token issued");

        Ok(VerificationRequest::Issued(issued.token))
    }

    async fn verify_email(&self, token: &str) -> AppResult<()> {
        let claims = self.tokens.decode(token, TokenScope::ConfirmEmail)?;

        let mut user = self
            .users
            .find_by_email(&claims.email)
            .await?
            .filter(|user| user.id == claims.sub)
            .ok_or_invalid_token()?;

        if !user.mark_verified() {
            tracing::debug!(user_id = %user.id, "Email already verified");
            return Ok(());
        }

        self.users.update(user).await?;
        self.cache.invalidate(&user_key(claims.sub)).await?;
        tracing::info!(user_id = %claims.sub, "Email verified");

        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let found = self.users.find_by_email(email).await?;

        // Unknown emails still pay for one verification so response time
        // does not reveal which addresses are registered.
        let stored_hash = match &found {
            Some(user) => user.password_hash.clone(),
            None => Password::dummy().into_string(),
        };
        let password_valid = verify_password(stored_hash, password.to_string()).await?;

        let user = match found {
            Some(user) if password_valid && user.is_verified => user,
            Some(user) => {
                tracing::debug!(
                    user_id = %user.id,
                    password_valid,
                    is_verified = user.is_verified,
                    "Login rejected"
                );
                return Err(AppError::InvalidCredentials);
            }
            None => return Err(AppError::InvalidCredentials),
        };

        let pair = self.issue_pair(&user).await?;
        tracing::info!(user_id = %user.id, "User authenticated");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.decode(refresh_token, TokenScope::RefreshToken)?;
        let key = slot_key(claims.sub, TokenScope::RefreshToken)?;

        if !self
            .cache
            .compare_and_invalidate(&key, &claims.jti.to_string())
            .await?
        {
            // A stale refresh token means it was already used: end the session.
            tracing::warn!(user_id = %claims.sub, "Refresh token reuse, revoking session");
            self.cache.invalidate(&key).await?;
            return Err(AppError::InvalidToken);
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_invalid_token()?;

        let pair = self.issue_pair(&user).await?;
        tracing::debug!(user_id = %user.id, "Tokens refreshed");

        Ok(pair)
    }

    async fn current_user(&self, access_token: &str) -> AppResult<User> {
        let claims = self.authorize(access_token).await?;
        let key = user_key(claims.sub);

        if let Some(user) = get_json::<User>(self.cache.as_ref(), &key).await? {
            return Ok(user);
        }

        let mut user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_invalid_token()?;
        put_json(self.cache.as_ref(), &key, &user, self.user_cache_ttl).await?;

        // Cached copies never carry the hash; keep both paths identical.
        user.password_hash.clear();
        Ok(user)
    }

    async fn logout(&self, access_token: &str) -> AppResult<()> {
        let claims = self.authorize(access_token).await?;
        self.revoke_sessions(claims.sub).await?;
        tracing::info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> AppResult<Option<String>> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let issued = self.tokens.issue(&user, TokenScope::ResetPassword)?;
        self.remember(&issued).await?;
        tracing::info!(user_id = %user.id, "Password reset token issued");

        Ok(Some(issued.token))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let claims = self.tokens.decode(token, TokenScope::ResetPassword)?;
        Password::check_length(new_password)?;

        let key = slot_key(claims.sub, TokenScope::ResetPassword)?;
        if !self
            .cache
            .compare_and_invalidate(&key, &claims.jti.to_string())
            .await?
        {
            return Err(AppError::InvalidToken);
        }

        let mut user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_invalid_token()?;
        if !user.is_verified {
            return Err(AppError::InvalidCredentials);
        }

        let password = hash_password(new_password.to_string()).await?;
        user.change_password_hash(password.into_string());
        self.users.update(user).await?;

        self.revoke_sessions(claims.sub).await?;
        tracing::info!(user_id = %claims.sub, "Password reset");

        Ok(())
    }
}

fn slot_key(user_id: Uuid, scope: TokenScope) -> AppResult<String> {
    token_key(user_id, scope)
        .ok_or_else(|| AppError::internal(format!("Scope {} is not cached", scope)))
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_password(plain_text: String) -> AppResult<Password> {
    let password = tokio::task::spawn_blocking(move || Password::new(&plain_text))
        .await
        .map_err(|e| AppError::internal(format!("Hashing task failed: {}", e)))??;
    Ok(password)
}

async fn verify_password(hash: String, plain_text: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || Password::from_hash(hash).verify(&plain_text))
        .await
        .map_err(|e| AppError::internal(format!("Verification task failed: {}", e)))
}
