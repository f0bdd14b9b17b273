//! Weak-item classification
//!
//! Idempotent upsert of the weak-item record for a (user, item) pair.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use recall_common::{RecallError, Result, WeakItem, DEFAULT_EASE_FACTOR};

use crate::infra::weak_item_store::WeakItemStore;

/// Creates or refreshes weak-item records
#[derive(Clone)]
pub struct WeakItemClassifier {
    store: Arc<dyn WeakItemStore>,
    initial_ease: f64,
}

impl WeakItemClassifier {
    pub fn new(store: Arc<dyn WeakItemStore>) -> Self {
        Self {
            store,
            initial_ease: DEFAULT_EASE_FACTOR,
        }
    }

    /// Ease factor given to newly created records
    pub fn with_initial_ease(mut self, ease_factor: f64) -> Self {
        self.initial_ease = ease_factor;
        self
    }

    /// Record the pair as weak
    #[instrument(skip(self))]
    pub async fn classify(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        success_rate: f64,
        attempt_count: u32,
    ) -> Result<WeakItem> {
        self.classify_at(user_id, item_id, success_rate, attempt_count, Utc::now())
            .await
    }

    /// Record the pair as weak at an explicit time
    ///
    /// New records start with interval 1 and the initial ease (2.5 unless
    /// configured) and are due the same day.
    /// Existing records only get their performance figures refreshed; their
    /// schedule is left to the review scheduler.
    pub async fn classify_at(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        success_rate: f64,
        attempt_count: u32,
        now: DateTime<Utc>,
    ) -> Result<WeakItem> {
        if !(0.0..=100.0).contains(&success_rate) {
            return Err(RecallError::Validation(format!(
                "success rate must be within 0..=100, got {}",
                success_rate
            )));
        }

        let item = match self.store.get(&user_id, &item_id).await? {
            Some(mut existing) => {
                existing.record_performance(success_rate, attempt_count, now);
                debug!(weak_item = %existing.id, "Updating weak item");
                existing
            }
            None => {
                let mut created = WeakItem::new(user_id, item_id, success_rate, attempt_count, now);
                created.ease_factor = self.initial_ease;
                debug!(weak_item = %created.id, "Creating weak item");
                created
            }
        };

        self.store.upsert(item.clone()).await?;
        Ok(item)
    }
}
