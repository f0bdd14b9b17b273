//! Review service
//!
//! Wires the collaborators into the scheduling components and exposes the
//! operations the HTTP layer calls.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use recall_common::{
    AttemptScore, DailyReviewQueue, ExerciseRef, RecallError, Result, ReviewOverview,
    ReviewSchedule,
};

use crate::config::SchedulerConfig;
use crate::domain::classifier::WeakItemClassifier;
use crate::domain::composer::DailyReviewComposer;
use crate::domain::graduation::GraduationEvaluator;
use crate::domain::scheduler::{ReviewScheduler, SchedulePreview};
use crate::domain::success_rate::{SuccessRateReport, SuccessRateTracker};
use crate::infra::connect_cache;
use crate::infra::exercise_resolver::ExerciseResolver;
use crate::infra::history_store::{InMemoryHistoryStore, PerformanceHistoryStore};
use crate::infra::review_cache::{InMemoryReviewCache, ReviewCache};
use crate::infra::weak_item_store::{InMemoryWeakItemStore, WeakItemStore};

/// Spaced-repetition service
pub struct ReviewService {
    history: Arc<dyn PerformanceHistoryStore>,
    store: Arc<dyn WeakItemStore>,
    tracker: SuccessRateTracker,
    scheduler: ReviewScheduler,
    composer: DailyReviewComposer,
    graduation: GraduationEvaluator,
}

impl ReviewService {
    /// Create a service over explicit collaborators
    pub fn new(
        config: SchedulerConfig,
        history: Arc<dyn PerformanceHistoryStore>,
        store: Arc<dyn WeakItemStore>,
        cache: Arc<dyn ReviewCache>,
        resolver: Arc<dyn ExerciseResolver>,
    ) -> Self {
        let classifier =
            WeakItemClassifier::new(store.clone()).with_initial_ease(config.scheduling.default_ease);

        Self {
            tracker: SuccessRateTracker::new(history.clone(), classifier, config.tracking),
            scheduler: ReviewScheduler::new(
                store.clone(),
                cache.clone(),
                config.scheduling,
                config.cache.clone(),
            ),
            composer: DailyReviewComposer::new(
                store.clone(),
                resolver,
                cache.clone(),
                config.composition,
                config.cache.clone(),
            ),
            graduation: GraduationEvaluator::new(
                history.clone(),
                store.clone(),
                cache,
                config.graduation,
                config.cache,
            ),
            history,
            store,
        }
    }

    /// Create a service whose cache is built from the configuration
    pub async fn connect(
        config: SchedulerConfig,
        history: Arc<dyn PerformanceHistoryStore>,
        store: Arc<dyn WeakItemStore>,
        resolver: Arc<dyn ExerciseResolver>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RecallError::Config(e.to_string()))?;

        let cache = connect_cache(&config.cache).await;
        info!("Review service initialized");
        Ok(Self::new(config, history, store, cache, resolver))
    }

    /// Create a service over in-memory collaborators
    pub fn in_memory(config: SchedulerConfig, resolver: Arc<dyn ExerciseResolver>) -> Self {
        let cache = Arc::new(InMemoryReviewCache::new(config.cache.max_in_memory_entries));
        Self::new(
            config,
            Arc::new(InMemoryHistoryStore::new()),
            Arc::new(InMemoryWeakItemStore::new()),
            cache,
            resolver,
        )
    }

    /// Persist an attempt and re-evaluate the item
    #[instrument(skip(self, attempt), fields(user_id = %attempt.user_id, item_id = %attempt.item_id))]
    pub async fn record_attempt(&self, attempt: AttemptScore) -> Result<SuccessRateReport> {
        let (user_id, item_id, score) = (attempt.user_id, attempt.item_id, attempt.score);
        if score > recall_common::MAX_SCORE {
            return Err(RecallError::score_out_of_range("score", score));
        }

        self.history.append(attempt).await?;
        self.tracker.track(user_id, item_id, score).await
    }

    /// Re-evaluate an item whose latest attempt is already persisted
    pub async fn track_success(&self, user_id: Uuid, item_id: Uuid, latest_score: u8) -> Result<SuccessRateReport> {
        self.tracker.track(user_id, item_id, latest_score).await
    }

    /// Apply a review result to a weak item
    pub async fn schedule_review(&self, user_id: Uuid, item_id: Uuid, performance: u8) -> Result<ReviewSchedule> {
        self.scheduler.schedule(user_id, item_id, performance).await
    }

    /// Latest schedule of an item, if still cached
    pub async fn cached_schedule(&self, user_id: Uuid, item_id: Uuid) -> Option<ReviewSchedule> {
        self.scheduler.cached_schedule(user_id, item_id).await
    }

    /// Schedules each answer band would produce for a weak item
    pub async fn preview_schedule(&self, user_id: Uuid, item_id: Uuid) -> Result<SchedulePreview> {
        let item = self
            .store
            .get(&user_id, &item_id)
            .await?
            .ok_or(RecallError::NotFound { user_id, item_id })?;
        self.scheduler.preview(&item, Utc::now().date_naive())
    }

    /// Today's mixed queue for a user
    pub async fn daily_queue(&self, user_id: Uuid, new_candidates: Vec<ExerciseRef>) -> Result<DailyReviewQueue> {
        self.composer.compose(user_id, new_candidates).await
    }

    /// Retire an item if mastered
    pub async fn try_graduate(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        self.graduation.evaluate(user_id, item_id).await
    }

    /// Retire every mastered item of a user
    pub async fn sweep_graduations(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        self.graduation.sweep_user(user_id).await
    }

    /// Summary of a user's backlog
    #[instrument(skip(self))]
    pub async fn overview(&self, user_id: Uuid) -> Result<ReviewOverview> {
        let items = self.store.list_for_user(&user_id).await?;
        Ok(ReviewOverview::from_items(user_id, &items, Utc::now().date_naive()))
    }
}
