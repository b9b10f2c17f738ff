//! Cache layer - short-lived token state and cached user lookups.
//!
//! Every entry carries a TTL. An entry is absent from the moment its TTL has
//! elapsed: a read at exactly `stored_at + ttl` returns `None`.
//!
//! Backends report outages as `AppError::CacheUnavailable`; callers must
//! treat that as a rejection, never as a cache miss.

mod memory;
mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::TokenScope;

pub use self::memory::MemoryCache;
pub use self::redis_cache::RedisCache;

/// Cache key prefix for live token ids
pub const CACHE_PREFIX_TOKEN: &str = "token:";

/// Cache key prefix for authenticated-user lookups
pub const CACHE_PREFIX_USER: &str = "user:";

/// Key-value contract consumed by the auth service.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key`, replacing any existing entry.
    /// A zero `ttl` leaves the key absent.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Fetch a live entry.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Remove an entry. Removing a missing key is not an error.
    async fn invalidate(&self, key: &str) -> AppResult<()>;

    /// Atomically remove `key` only if it currently holds `expected`.
    ///
    /// Returns `true` if this call removed the entry. Of any number of
    /// concurrent callers presenting the same value, at most one sees `true`.
    async fn compare_and_invalidate(&self, key: &str, expected: &str) -> AppResult<bool>;
}

/// Key that tracks the live token of `scope` for `user_id`.
///
/// Returns `None` for scopes that are not tracked in the cache.
pub fn token_key(user_id: Uuid, scope: TokenScope) -> Option<String> {
    scope
        .cache_slot()
        .map(|slot| format!("{}{}:{}", CACHE_PREFIX_TOKEN, user_id, slot))
}

/// Key of the cached lookup for `user_id`.
pub fn user_key(user_id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_USER, user_id)
}

/// Read and deserialize a JSON entry.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheStore,
    key: &str,
) -> AppResult<Option<T>> {
    match cache.get(key).await? {
        Some(json) => {
            let parsed = serde_json::from_str(&json).map_err(|e| {
                AppError::internal(format!("Cache deserialization error: {}", e))
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Serialize and store a JSON entry.
pub async fn put_json<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> AppResult<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
    cache.put(key, &json, ttl).await
}
