//! Review cache
//!
//! Ephemeral TTL key-value cache for computed daily queues and per-item
//! schedules. The cache is an optimization only: a failing backend must never
//! fail the operation that consulted it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use recall_common::CacheError;

/// Trait for cache backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewCache: Send + Sync {
    /// Get a live value
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value for `ttl_secs` seconds
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    /// Drop a value
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache key components
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// Composed queue for one user and day
    DailyQueue { user_id: Uuid, date: NaiveDate },
    /// Latest schedule for one (user, item) pair
    Schedule { user_id: Uuid, item_id: Uuid },
}

impl CacheKey {
    pub fn to_cache_key(&self, prefix: &str) -> String {
        match self {
            CacheKey::DailyQueue { user_id, date } => {
                format!("{}:daily_queue:{}:{}", prefix, user_id, date.format("%Y-%m-%d"))
            }
            CacheKey::Schedule { user_id, item_id } => {
                format!("{}:schedule:{}:{}", prefix, user_id, item_id)
            }
        }
    }
}

/// Read and decode a JSON value
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn ReviewCache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| CacheError::Decode(e.to_string())),
        None => Ok(None),
    }
}

/// Encode and store a JSON value
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn ReviewCache,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let json = serde_json::to_string(value).map_err(|e| CacheError::Command(e.to_string()))?;
    cache.set(key, json, ttl_secs).await
}

/// Read a JSON value, treating any cache failure as a miss
pub async fn get_json_or_miss<T: DeserializeOwned>(cache: &dyn ReviewCache, key: &str) -> Option<T> {
    match get_json(cache, key).await {
        Ok(Some(value)) => {
            debug!(key, "Cache hit");
            Some(value)
        }
        Ok(None) => {
            debug!(key, "Cache miss");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "Cache read failed, recomputing");
            None
        }
    }
}

/// Store a JSON value, logging instead of failing
pub async fn set_json_quietly<T: Serialize + Sync>(
    cache: &dyn ReviewCache,
    key: &str,
    value: &T,
    ttl_secs: u64,
) {
    if let Err(e) = set_json(cache, key, value, ttl_secs).await {
        warn!(key, error = %e, "Cache write failed");
    }
}

/// Invalidate a key, logging instead of failing
pub async fn invalidate_quietly(cache: &dyn ReviewCache, key: &str) {
    match cache.invalidate(key).await {
        Ok(()) => debug!(key, "Invalidated cache entry"),
        Err(e) => warn!(key, error = %e, "Cache invalidation failed"),
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory fallback cache using DashMap
pub struct InMemoryReviewCache {
    cache: DashMap<String, CachedEntry>,
    max_entries: usize,
}

impl InMemoryReviewCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: DashMap::new(),
            max_entries,
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn evict_if_full(&self) {
        if self.cache.len() < self.max_entries {
            return;
        }

        let now = Utc::now();
        self.cache.retain(|_, v| now < v.expires_at);

        // If still at capacity, drop the entry closest to expiry
        if self.cache.len() >= self.max_entries {
            let soonest = self
                .cache
                .iter()
                .min_by_key(|e| e.expires_at)
                .map(|e| e.key().clone());
            if let Some(key) = soonest {
                self.cache.remove(&key);
            }
        }
    }
}

impl Default for InMemoryReviewCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ReviewCache for InMemoryReviewCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        let live = self
            .cache
            .get(key)
            .map(|entry| (now < entry.expires_at).then(|| entry.value.clone()));

        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.cache.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        if !self.cache.contains_key(key) {
            self.evict_if_full();
        }

        let ttl = Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64);
        self.cache.insert(
            key.to_string(),
            CachedEntry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.cache.remove(key);
        Ok(())
    }
}
