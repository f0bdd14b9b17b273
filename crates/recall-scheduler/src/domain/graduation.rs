//! Graduation
//!
//! An item leaves spaced repetition once its three most recent attempts all
//! passed and averaged at least 85. A single recent low score blocks
//! graduation regardless of older history.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use recall_common::{AttemptScore, Result};

use crate::config::{CacheSettings, GraduationSettings};
use crate::infra::history_store::PerformanceHistoryStore;
use crate::infra::review_cache::{invalidate_quietly, CacheKey, ReviewCache};
use crate::infra::weak_item_store::WeakItemStore;

/// Whether a newest-first history shows mastery
pub fn meets_mastery(recent_newest_first: &[AttemptScore], settings: &GraduationSettings) -> bool {
    if recent_newest_first.len() < settings.window {
        return false;
    }

    let window = &recent_newest_first[..settings.window];
    if window.iter().any(|a| a.score < settings.min_score) {
        return false;
    }

    let mean = window.iter().map(|a| a.score as f64).sum::<f64>() / window.len() as f64;
    mean >= settings.min_mean
}

/// Retires mastered weak items
pub struct GraduationEvaluator {
    history: Arc<dyn PerformanceHistoryStore>,
    store: Arc<dyn WeakItemStore>,
    cache: Arc<dyn ReviewCache>,
    settings: GraduationSettings,
    cache_settings: CacheSettings,
}

impl GraduationEvaluator {
    pub fn new(
        history: Arc<dyn PerformanceHistoryStore>,
        store: Arc<dyn WeakItemStore>,
        cache: Arc<dyn ReviewCache>,
        settings: GraduationSettings,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            history,
            store,
            cache,
            settings,
            cache_settings,
        }
    }

    /// Graduate the item if mastered, returning whether it was removed
    #[instrument(skip(self))]
    pub async fn evaluate(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        if self.store.get(&user_id, &item_id).await?.is_none() {
            return Ok(false);
        }

        let recent = self
            .history
            .recent(&user_id, &item_id, self.settings.window)
            .await?;

        if !meets_mastery(&recent, &self.settings) {
            debug!(%user_id, %item_id, attempts = recent.len(), "Not yet mastered");
            return Ok(false);
        }

        let removed = self.store.delete(&user_id, &item_id).await?;
        if removed {
            info!(%user_id, %item_id, "Graduated weak item");
            self.forget_cached(user_id, item_id).await;
        }
        Ok(removed)
    }

    /// Evaluate every tracked item of a user, returning the graduated item ids
    #[instrument(skip(self))]
    pub async fn sweep_user(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let items = self.store.list_for_user(&user_id).await?;

        let mut graduated = Vec::new();
        for item in items {
            if self.evaluate(user_id, item.item_id).await? {
                graduated.push(item.item_id);
            }
        }

        debug!(%user_id, graduated = graduated.len(), "Graduation sweep done");
        Ok(graduated)
    }

    async fn forget_cached(&self, user_id: Uuid, item_id: Uuid) {
        let prefix = &self.cache_settings.key_prefix;
        let today = Utc::now().date_naive();

        invalidate_quietly(
            self.cache.as_ref(),
            &CacheKey::Schedule { user_id, item_id }.to_cache_key(prefix),
        )
        .await;
        invalidate_quietly(
            self.cache.as_ref(),
            &CacheKey::DailyQueue { user_id, date: today }.to_cache_key(prefix),
        )
        .await;
    }
}
