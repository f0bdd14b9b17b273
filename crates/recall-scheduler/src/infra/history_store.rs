//! Performance history storage
//!
//! Append-only log of scored attempts keyed by (user, item).

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use recall_common::{AttemptScore, StoreError};

/// Trait for performance history backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PerformanceHistoryStore: Send + Sync {
    /// Append an attempt to the log
    async fn append(&self, attempt: AttemptScore) -> Result<(), StoreError>;

    /// Get up to `limit` most-recent attempts, newest first
    async fn recent(
        &self,
        user_id: &Uuid,
        item_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<AttemptScore>, StoreError>;
}

/// In-memory history log
///
/// Attempts for a pair are kept sorted by timestamp so out-of-order appends
/// still read back newest-first.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    attempts: RwLock<HashMap<(Uuid, Uuid), Vec<AttemptScore>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total attempts recorded for a pair
    pub fn count(&self, user_id: &Uuid, item_id: &Uuid) -> usize {
        self.attempts
            .read()
            .get(&(*user_id, *item_id))
            .map(|a| a.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl PerformanceHistoryStore for InMemoryHistoryStore {
    async fn append(&self, attempt: AttemptScore) -> Result<(), StoreError> {
        let mut attempts = self.attempts.write();
        let log = attempts
            .entry((attempt.user_id, attempt.item_id))
            .or_default();

        // Equal timestamps keep insertion order
        let pos = log.partition_point(|a| a.timestamp <= attempt.timestamp);
        log.insert(pos, attempt);
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &Uuid,
        item_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<AttemptScore>, StoreError> {
        Ok(self
            .attempts
            .read()
            .get(&(*user_id, *item_id))
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
