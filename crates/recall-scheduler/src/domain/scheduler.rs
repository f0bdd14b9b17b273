//! SM-2 review scheduling
//!
//! Variant of SuperMemo 2 driven by 0-100 performances:
//!
//! ```text
//! q  = floor(performance / 100 × 5)
//! q ≥ 3:  I' = 1 if I = 1, 6 if I = 2, else round(I × EF)
//!         EF' = EF + (0.1 − (5 − q) × (0.08 + (5 − q) × 0.02))
//! q < 3:  I' = 1
//!         EF' = EF − 0.2
//! EF' clamped to the configured bounds;  I' capped at the configured maximum
//! next review = today + I'
//! ```

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use recall_common::{Quality, RecallError, Result, ReviewSchedule, WeakItem};

use crate::config::{CacheSettings, SchedulingSettings};
use crate::infra::review_cache::{
    get_json_or_miss, invalidate_quietly, set_json_quietly, CacheKey, ReviewCache,
};
use crate::infra::weak_item_store::WeakItemStore;

/// Interval after the second successful step
const SECOND_STEP_INTERVAL: u32 = 6;

/// Compute the next schedule for an item without persisting it
pub fn compute_schedule(
    item: &WeakItem,
    performance: u8,
    today: NaiveDate,
    settings: &SchedulingSettings,
) -> Result<ReviewSchedule> {
    let quality = Quality::from_performance(performance)?;
    schedule_for_quality(item, quality, today, settings)
}

fn schedule_for_quality(
    item: &WeakItem,
    quality: Quality,
    today: NaiveDate,
    settings: &SchedulingSettings,
) -> Result<ReviewSchedule> {
    let current_interval = item.review_interval.max(1);
    let current_ease = item.ease_factor;
    let cap = settings.max_interval_days.max(1);

    let (interval, ease_factor) = if quality.is_passing() {
        let interval = match current_interval {
            1 => 1,
            2 => SECOND_STEP_INTERVAL,
            n => (n as f64 * current_ease).round().min(cap as f64) as u32,
        };
        let lapse = (5 - quality.value()) as f64;
        (interval.min(cap), current_ease + (0.1 - lapse * (0.08 + lapse * 0.02)))
    } else {
        (1, current_ease - settings.failure_penalty)
    };

    let next_review = today
        .checked_add_days(Days::new(interval as u64))
        .ok_or_else(|| {
            RecallError::Validation(format!(
                "next review {} days after {} is out of calendar range",
                interval, today
            ))
        })?;

    Ok(ReviewSchedule {
        item_id: item.item_id,
        next_review,
        interval,
        ease_factor: settings.clamp_ease(ease_factor),
        quality,
    })
}

/// What each answer band would schedule, for UI hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreview {
    /// Failed recall (quality 1)
    pub again: ReviewSchedule,
    /// Correct with serious difficulty (quality 3)
    pub hard: ReviewSchedule,
    /// Correct after hesitation (quality 4)
    pub good: ReviewSchedule,
    /// Perfect recall (quality 5)
    pub easy: ReviewSchedule,
}

/// Preview the schedule each answer band would produce
pub fn preview(item: &WeakItem, today: NaiveDate, settings: &SchedulingSettings) -> Result<SchedulePreview> {
    Ok(SchedulePreview {
        again: schedule_for_quality(item, Quality::AGAIN, today, settings)?,
        hard: schedule_for_quality(item, Quality::PASSING, today, settings)?,
        good: schedule_for_quality(item, Quality::GOOD, today, settings)?,
        easy: schedule_for_quality(item, Quality::PERFECT, today, settings)?,
    })
}

/// Applies SM-2 updates to stored weak items
pub struct ReviewScheduler {
    store: Arc<dyn WeakItemStore>,
    cache: Arc<dyn ReviewCache>,
    settings: SchedulingSettings,
    cache_settings: CacheSettings,
}

impl ReviewScheduler {
    pub fn new(
        store: Arc<dyn WeakItemStore>,
        cache: Arc<dyn ReviewCache>,
        settings: SchedulingSettings,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
            cache_settings,
        }
    }

    /// Preview each answer band for an item under this scheduler's settings
    pub fn preview(&self, item: &WeakItem, today: NaiveDate) -> Result<SchedulePreview> {
        preview(item, today, &self.settings)
    }

    /// Schedule the next review of an item after a review attempt
    #[instrument(skip(self))]
    pub async fn schedule(&self, user_id: Uuid, item_id: Uuid, performance: u8) -> Result<ReviewSchedule> {
        self.schedule_at(user_id, item_id, performance, Utc::now()).await
    }

    /// Schedule at an explicit time
    pub async fn schedule_at(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        performance: u8,
        now: DateTime<Utc>,
    ) -> Result<ReviewSchedule> {
        // Validate before touching the store
        let quality = Quality::from_performance(performance)?;

        let mut item = self
            .store
            .get(&user_id, &item_id)
            .await?
            .ok_or(RecallError::NotFound { user_id, item_id })?;

        let today = now.date_naive();
        let schedule = schedule_for_quality(&item, quality, today, &self.settings)?;

        item.apply_schedule(&schedule, now);
        self.store.upsert(item).await?;

        info!(
            %user_id,
            %item_id,
            quality = quality.value(),
            interval = schedule.interval,
            ease_factor = schedule.ease_factor,
            next_review = %schedule.next_review,
            "Scheduled review"
        );

        let prefix = &self.cache_settings.key_prefix;
        set_json_quietly(
            self.cache.as_ref(),
            &CacheKey::Schedule { user_id, item_id }.to_cache_key(prefix),
            &schedule,
            self.cache_settings.schedule_ttl_secs,
        )
        .await;
        invalidate_quietly(
            self.cache.as_ref(),
            &CacheKey::DailyQueue { user_id, date: today }.to_cache_key(prefix),
        )
        .await;

        Ok(schedule)
    }

    /// Most recent schedule of an item, if still cached
    #[instrument(skip(self))]
    pub async fn cached_schedule(&self, user_id: Uuid, item_id: Uuid) -> Option<ReviewSchedule> {
        let key = CacheKey::Schedule { user_id, item_id }.to_cache_key(&self.cache_settings.key_prefix);
        get_json_or_miss(self.cache.as_ref(), &key).await
    }
}
