//! Auth Service Library
//!
//! Token-based authentication for the contacts backend: registration,
//! email verification, access/refresh token issue and rotation, logout,
//! password reset, and cached lookups of the authenticated user.
//!
//! The service talks to two collaborators through traits:
//! [`repository::UserRepository`] for user records and [`cache::CacheStore`]
//! for token liveness and lookup caching.

pub mod cache;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use common::AppResult;

use crate::cache::RedisCache;
use crate::config::AuthServiceConfig;
use crate::infra::Database;
use crate::repository::UserStore;
use crate::service::Authenticator;

/// Connect to Postgres and Redis and build the service.
pub async fn connect(config: &AuthServiceConfig) -> AppResult<Authenticator> {
    let database = Database::connect(&config.database).await?;
    let cache = RedisCache::connect(&config.cache).await?;

    let service = Authenticator::new(
        Arc::new(UserStore::new(database.get_connection())),
        Arc::new(cache),
        &config.jwt,
    )
    .with_user_cache_ttl(Duration::from_secs(config.cache.user_ttl_seconds));

    Ok(service)
}

/// Check that both backends answer.
pub async fn check_health(config: &AuthServiceConfig) -> AppResult<()> {
    let database = Database::connect(&config.database).await?;
    database.ping().await?;

    let cache = RedisCache::connect(&config.cache).await?;
    cache.ping().await?;

    tracing::info!("Database and cache are reachable");
    Ok(())
}
