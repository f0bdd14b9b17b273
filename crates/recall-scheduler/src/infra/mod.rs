//! Collaborator contracts and their implementations

pub mod exercise_resolver;
pub mod history_store;
pub mod redis_cache;
pub mod review_cache;
pub mod weak_item_store;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::CacheSettings;
use redis_cache::RedisReviewCache;
use review_cache::{InMemoryReviewCache, ReviewCache};

/// Build the configured cache backend
///
/// Falls back to the in-memory cache when Redis is not configured or cannot be
/// reached, so a cache outage only costs recomputation.
pub async fn connect_cache(settings: &CacheSettings) -> Arc<dyn ReviewCache> {
    if let Some(url) = settings.redis_url.as_deref() {
        match RedisReviewCache::new(url).await {
            Ok(cache) => {
                info!("Using Redis review cache");
                return Arc::new(cache);
            }
            Err(e) => warn!(error = %e, "Redis unavailable, falling back to in-memory cache"),
        }
    }

    Arc::new(InMemoryReviewCache::new(settings.max_in_memory_entries))
}
