//! Weak item storage
//!
//! Scheduling state for flagged items, one record per (user, item).

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

use recall_common::{StoreError, WeakItem};

/// Trait for weak item backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeakItemStore: Send + Sync {
    /// Get the weak item for a pair
    async fn get(&self, user_id: &Uuid, item_id: &Uuid) -> Result<Option<WeakItem>, StoreError>;

    /// Insert or replace the weak item for its (user, item) pair
    async fn upsert(&self, item: WeakItem) -> Result<(), StoreError>;

    /// Delete the weak item for a pair, returning whether one existed
    async fn delete(&self, user_id: &Uuid, item_id: &Uuid) -> Result<bool, StoreError>;

    /// Items of a user with `next_review <= as_of`
    async fn list_due(&self, user_id: &Uuid, as_of: NaiveDate) -> Result<Vec<WeakItem>, StoreError>;

    /// All items tracked for a user
    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<WeakItem>, StoreError>;
}

/// In-memory weak item store
///
/// Records are sharded by user so due queries never scan other learners.
#[derive(Default)]
pub struct InMemoryWeakItemStore {
    by_user: DashMap<Uuid, HashMap<Uuid, WeakItem>>,
}

impl InMemoryWeakItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tracked items across all users
    pub fn total_count(&self) -> usize {
        self.by_user.iter().map(|e| e.len()).sum()
    }

    /// Users with at least one tracked item
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[async_trait]
impl WeakItemStore for InMemoryWeakItemStore {
    async fn get(&self, user_id: &Uuid, item_id: &Uuid) -> Result<Option<WeakItem>, StoreError> {
        Ok(self
            .by_user
            .get(user_id)
            .and_then(|items| items.get(item_id).cloned()))
    }

    async fn upsert(&self, item: WeakItem) -> Result<(), StoreError> {
        let mut items = self.by_user.entry(item.user_id).or_default();

        match items.get_mut(&item.item_id) {
            Some(existing) => {
                // Keep the original identity of the record
                let id = existing.id;
                let created_at = existing.created_at;
                *existing = item;
                existing.id = id;
                existing.created_at = created_at;
            }
            None => {
                items.insert(item.item_id, item);
            }
        }
        Ok(())
    }

    async fn delete(&self, user_id: &Uuid, item_id: &Uuid) -> Result<bool, StoreError> {
        let removed = {
            let Some(mut items) = self.by_user.get_mut(user_id) else {
                return Ok(false);
            };
            items.remove(item_id).is_some()
        };

        // Drop the user's shard once its last item is gone
        self.by_user.remove_if(user_id, |_, items| items.is_empty());
        Ok(removed)
    }

    async fn list_due(&self, user_id: &Uuid, as_of: NaiveDate) -> Result<Vec<WeakItem>, StoreError> {
        Ok(self
            .by_user
            .get(user_id)
            .map(|items| {
                items
                    .values()
                    .filter(|i| i.is_due(as_of))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<WeakItem>, StoreError> {
        Ok(self
            .by_user
            .get(user_id)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }
}
