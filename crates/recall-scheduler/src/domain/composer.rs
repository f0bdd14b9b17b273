//! Daily review queue composition
//!
//! A session blends caller-supplied new material with due reviews:
//!
//! ```text
//! total  = max(10, |new|)
//! review = min(ceil(total × 30%), |due|)
//! new    = total − review
//! ```
//!
//! The two lists are zipper-merged (new, review, new, review, …) and the result
//! is memoized per user and day.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use recall_common::{DailyReviewQueue, ExerciseRef, QueueEntry, QueueSource, Result, WeakItem};

use crate::config::{CacheSettings, CompositionSettings};
use crate::infra::exercise_resolver::ExerciseResolver;
use crate::infra::review_cache::{get_json_or_miss, set_json_quietly, CacheKey, ReviewCache};
use crate::infra::weak_item_store::WeakItemStore;

/// Slot allocation of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlan {
    /// Session size
    pub total: usize,
    /// Slots given to due reviews
    pub review: usize,
    /// Slots offered to new material (may exceed what is available)
    pub new: usize,
}

impl SlotPlan {
    /// Upper bound of review slots for a session of `total`
    pub fn review_cap(total: usize, review_share_percent: u32) -> usize {
        // Integer ceil keeps 30% of 10 at exactly 3
        (total * review_share_percent as usize).div_ceil(100)
    }

    pub fn new(new_available: usize, due_available: usize, settings: &CompositionSettings) -> Self {
        let total = settings.min_session_size.max(new_available);
        let review = Self::review_cap(total, settings.review_share_percent).min(due_available);
        Self {
            total,
            review,
            new: total - review,
        }
    }
}

/// Zipper-merge new material with reviews, starting with new material
pub fn interleave(new: Vec<ExerciseRef>, reviews: Vec<ExerciseRef>) -> Vec<QueueEntry> {
    let mut entries = Vec::with_capacity(new.len() + reviews.len());
    let mut new = new.into_iter();
    let mut reviews = reviews.into_iter();

    loop {
        let next_new = new.next();
        let next_review = reviews.next();
        if next_new.is_none() && next_review.is_none() {
            break;
        }
        if let Some(exercise) = next_new {
            entries.push(QueueEntry {
                exercise,
                source: QueueSource::New,
            });
        }
        if let Some(exercise) = next_review {
            entries.push(QueueEntry {
                exercise,
                source: QueueSource::Review,
            });
        }
    }

    entries
}

/// Most overdue first, weakest first among equally overdue items
fn sort_by_urgency(items: &mut [WeakItem]) {
    items.sort_by(|a, b| {
        a.next_review
            .cmp(&b.next_review)
            .then(a.success_rate.total_cmp(&b.success_rate))
    });
}

/// Builds and memoizes daily review queues
pub struct DailyReviewComposer {
    store: Arc<dyn WeakItemStore>,
    resolver: Arc<dyn ExerciseResolver>,
    cache: Arc<dyn ReviewCache>,
    settings: CompositionSettings,
    cache_settings: CacheSettings,
}

impl DailyReviewComposer {
    pub fn new(
        store: Arc<dyn WeakItemStore>,
        resolver: Arc<dyn ExerciseResolver>,
        cache: Arc<dyn ReviewCache>,
        settings: CompositionSettings,
        cache_settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            resolver,
            cache,
            settings,
            cache_settings,
        }
    }

    /// Today's queue for a user
    #[instrument(skip(self, new_candidates), fields(new_candidates = new_candidates.len()))]
    pub async fn compose(&self, user_id: Uuid, new_candidates: Vec<ExerciseRef>) -> Result<DailyReviewQueue> {
        self.compose_at(user_id, new_candidates, Utc::now()).await
    }

    /// Queue for a user at an explicit time
    pub async fn compose_at(
        &self,
        user_id: Uuid,
        new_candidates: Vec<ExerciseRef>,
        now: DateTime<Utc>,
    ) -> Result<DailyReviewQueue> {
        let today = now.date_naive();
        let key = self.cache_key(user_id, today);

        if let Some(cached) = get_json_or_miss::<DailyReviewQueue>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let total = self.settings.min_session_size.max(new_candidates.len());
        let review_cap = SlotPlan::review_cap(total, self.settings.review_share_percent);
        let reviews = self.due_exercises(user_id, today, review_cap).await?;

        let plan = SlotPlan::new(new_candidates.len(), reviews.len(), &self.settings);
        let new: Vec<ExerciseRef> = new_candidates.into_iter().take(plan.new).collect();
        let reviews: Vec<ExerciseRef> = reviews.into_iter().take(plan.review).collect();

        debug!(
            total = plan.total,
            review_slots = plan.review,
            new_used = new.len(),
            "Composed daily queue"
        );

        let queue = DailyReviewQueue {
            user_id,
            date: today,
            entries: interleave(new, reviews),
            generated_at: now,
        };

        set_json_quietly(
            self.cache.as_ref(),
            &key,
            &queue,
            self.cache_settings.daily_queue_ttl_secs,
        )
        .await;

        Ok(queue)
    }

    /// Resolve due items, most urgent first, until `limit` exercises are found
    async fn due_exercises(&self, user_id: Uuid, today: NaiveDate, limit: usize) -> Result<Vec<ExerciseRef>> {
        let mut due = self.store.list_due(&user_id, today).await?;
        sort_by_urgency(&mut due);

        let mut exercises = Vec::with_capacity(limit.min(due.len()));
        for item in &due {
            if exercises.len() >= limit {
                break;
            }
            match self.resolver.resolve(item).await? {
                Some(exercise) => exercises.push(exercise),
                None => warn!(item_id = %item.item_id, "No exercise for due item, skipping"),
            }
        }

        Ok(exercises)
    }

    fn cache_key(&self, user_id: Uuid, date: NaiveDate) -> String {
        CacheKey::DailyQueue { user_id, date }.to_cache_key(&self.cache_settings.key_prefix)
    }
}
