//! In-process cache store.
//!
//! Used for tests and single-node deployments. Expiry is checked on every
//! read; `purge_expired` (or the sweeper task) reclaims memory for keys that
//! are never read again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use common::{AppError, AppResult};

use super::CacheStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Map-backed cache with per-entry expiry.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Purge expired entries every `period` until the handle is aborted.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "Expired cache entries purged");
                }
            }
        })
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if ttl.is_zero() {
            entries.remove(key);
            return Ok(());
        }

        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| AppError::validation("Cache TTL is too large"))?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn compare_and_invalidate(&self, key: &str, expected: &str) -> AppResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let matches = match entries.get(key) {
            Some(entry) if entry.is_live(now) => entry.value == expected,
            Some(_) => {
                entries.remove(key);
                return Ok(false);
            }
            None => false,
        };

        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }
}
