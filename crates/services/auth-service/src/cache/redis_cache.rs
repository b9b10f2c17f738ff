//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use common::{AppResult, CacheConfig};

use super::CacheStore;

/// Delete the key only if it still holds the caller's value.
const COMPARE_AND_DELETE: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

/// Redis cache wrapper over a reconnecting connection manager.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    ///
    /// Connection failures are returned as `CacheUnavailable`.
    pub async fn connect(config: &CacheConfig) -> AppResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }

    /// Round-trip a PING to check the server is reachable.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        if ttl.is_zero() {
            return self.invalidate(key).await;
        }

        // PX keeps sub-second TTLs exact; Redis rejects a zero expiry.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;

        tracing::trace!(key = %key, ttl_ms = millis, "Cache entry stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn compare_and_invalidate(&self, key: &str, expected: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let removed: i64 = redis::cmd("EVAL")
            .arg(COMPARE_AND_DELETE)
            .arg(1)
            .arg(key)
            .arg(expected)
            .query_async(&mut conn)
            .await?;

        Ok(removed == 1)
    }
}
