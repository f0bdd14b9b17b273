//! Redis review cache
//!
//! Production cache backend. Values are stored with `SET .. EX` so expiry is
//! enforced by Redis itself.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use recall_common::{CacheError, RecallError, Result};

use super::review_cache::ReviewCache;

/// Redis-based review cache
pub struct RedisReviewCache {
    /// Redis client
    client: Client,
    /// Shared multiplexed connection, re-established after failures
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl RedisReviewCache {
    /// Connect to Redis
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| RecallError::Config(format!("Failed to create Redis client: {}", e)))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(Some(connection))),
        })
    }

    /// Get a connection, reconnecting if the previous one was dropped
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, CacheError> {
        let guard = self.connection.read().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        drop(guard);

        let mut guard = self.connection.write().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(format!("Failed to reconnect to Redis: {}", e)))?;

        *guard = Some(connection.clone());
        Ok(connection)
    }

    /// Forget the current connection after an I/O failure
    async fn reset_connection(&self, err: &redis::RedisError) {
        if err.is_io_error() || err.is_connection_dropped() {
            warn!(error = %err, "Dropping Redis connection");
            *self.connection.write().await = None;
        }
    }
}

#[async_trait]
impl ReviewCache for RedisReviewCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        let mut conn = self.get_connection().await?;

        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.reset_connection(&e).await;
                Err(CacheError::Command(format!("Redis GET failed: {}", e)))
            }
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> std::result::Result<(), CacheError> {
        let mut conn = self.get_connection().await?;

        // Redis rejects EX 0
        let ttl_secs = ttl_secs.max(1);
        let result: redis::RedisResult<()> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                debug!(key, ttl_secs, "Cached value");
                Ok(())
            }
            Err(e) => {
                self.reset_connection(&e).await;
                Err(CacheError::Command(format!("Redis SET failed: {}", e)))
            }
        }
    }

    #[instrument(skip(self))]
    async fn invalidate(&self, key: &str) -> std::result::Result<(), CacheError> {
        let mut conn = self.get_connection().await?;

        match conn.del::<_, u64>(key).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.reset_connection(&e).await;
                Err(CacheError::Command(format!("Redis DEL failed: {}", e)))
            }
        }
    }
}
