//! End-to-end review flow over the in-memory collaborators

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use recall_common::{AttemptScore, ExerciseRef, QueueSource, RecallError};
use recall_scheduler::{
    CacheKey, InMemoryHistoryStore, InMemoryReviewCache, InMemoryWeakItemStore, ReviewCache,
    ReviewService, SchedulerConfig, StaticExerciseResolver, WeakItemStore,
};

struct Harness {
    store: Arc<InMemoryWeakItemStore>,
    cache: Arc<InMemoryReviewCache>,
    resolver: Arc<StaticExerciseResolver>,
    service: ReviewService,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryWeakItemStore::new());
        let cache = Arc::new(InMemoryReviewCache::default());
        let resolver = Arc::new(StaticExerciseResolver::new());
        let service = ReviewService::new(
            SchedulerConfig::default(),
            Arc::new(InMemoryHistoryStore::new()),
            store.clone(),
            cache.clone(),
            resolver.clone(),
        );
        Self {
            store,
            cache,
            resolver,
            service,
        }
    }

    /// Record scores oldest first, returning the last report
    async fn record(&self, user: Uuid, item: Uuid, scores: &[u8]) -> recall_scheduler::SuccessRateReport {
        let mut last = None;
        for score in scores {
            let attempt = AttemptScore::new(user, item, *score)
                .unwrap()
                .with_recognized_text("hola");
            last = Some(self.service.record_attempt(attempt).await.unwrap());
        }
        last.expect("at least one score")
    }

    fn register_review_exercise(&self, item: Uuid) -> ExerciseRef {
        let exercise = ExerciseRef::new(Uuid::new_v4(), item, "speaking");
        self.resolver.register(exercise.clone());
        exercise
    }
}

fn new_candidates(n: usize) -> Vec<ExerciseRef> {
    (0..n)
        .map(|_| ExerciseRef::new(Uuid::new_v4(), Uuid::new_v4(), "translation"))
        .collect()
}

#[tokio::test]
async fn test_failure_streak_flags_despite_passing_rate() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let item = Uuid::new_v4();

    // Newest three are 60, 65, 50; overall 7 of 10 pass
    let report = h
        .record(user, item, &[80, 85, 90, 75, 80, 85, 90, 60, 65, 50])
        .await;

    assert_eq!(report.attempts_considered, 10);
    assert_eq!(report.success_rate, 70.0);
    assert!(report.repeated_errors);
    assert!(report.flagged);

    let weak = h.store.get(&user, &item).await.unwrap().unwrap();
    assert_eq!(weak.attempt_count, 10);
    assert_eq!(weak.review_interval, 1);
    assert_eq!(weak.ease_factor, 2.5);
}

#[tokio::test]
async fn test_strong_item_is_never_tracked() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let item = Uuid::new_v4();

    let report = h.record(user, item, &[75, 90, 100, 80]).await;
    assert!(!report.flagged);
    assert!(h.store.get(&user, &item).await.unwrap().is_none());
}

#[tokio::test]
async fn test_schedule_scenarios() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let growing = Uuid::new_v4();
    let lapsed = Uuid::new_v4();
    h.record(user, growing, &[10]).await;
    h.record(user, lapsed, &[10]).await;

    let mut item = h.store.get(&user, &growing).await.unwrap().unwrap();
    item.review_interval = 6;
    h.store.upsert(item).await.unwrap();
    let mut item = h.store.get(&user, &lapsed).await.unwrap().unwrap();
    item.review_interval = 30;
    h.store.upsert(item).await.unwrap();

    let today = Utc::now().date_naive();

    let schedule = h.service.schedule_review(user, growing, 90).await.unwrap();
    assert_eq!(schedule.interval, 15);
    assert!((schedule.ease_factor - 2.5).abs() < 1e-9);
    assert!(schedule.next_review >= today);

    let schedule = h.service.schedule_review(user, lapsed, 40).await.unwrap();
    assert_eq!(schedule.interval, 1);
    assert!((schedule.ease_factor - 2.3).abs() < 1e-9);
    assert!(schedule.next_review >= today);

    assert_eq!(h.service.cached_schedule(user, lapsed).await, Some(schedule));
}

#[tokio::test]
async fn test_repeated_perfect_reviews_reach_the_interval_cap() {
    let mut config = SchedulerConfig::default();
    config.scheduling.max_interval_days = 365;
    let store = Arc::new(InMemoryWeakItemStore::new());
    let service = ReviewService::new(
        config,
        Arc::new(InMemoryHistoryStore::new()),
        store.clone(),
        Arc::new(InMemoryReviewCache::default()),
        Arc::new(StaticExerciseResolver::new()),
    );

    let user = Uuid::new_v4();
    let item = Uuid::new_v4();
    service
        .record_attempt(AttemptScore::new(user, item, 10).unwrap())
        .await
        .unwrap();
    let mut weak = store.get(&user, &item).await.unwrap().unwrap();
    weak.review_interval = 2;
    store.upsert(weak).await.unwrap();

    let today = Utc::now().date_naive();
    let mut schedule = None;
    for _ in 0..30 {
        schedule = Some(service.schedule_review(user, item, 100).await.unwrap());
    }
    let schedule = schedule.unwrap();
    assert_eq!(schedule.interval, 365);
    assert_eq!(schedule.next_review, today + chrono::Duration::days(365));

    let preview = service.preview_schedule(user, item).await.unwrap();
    assert_eq!(preview.easy.interval, 365);
    assert_eq!(store.get(&user, &item).await.unwrap().unwrap().review_interval, 365);
}

#[tokio::test]
async fn test_schedule_without_classification_is_not_found() {
    let h = Harness::new();
    let result = h.service.schedule_review(Uuid::new_v4(), Uuid::new_v4(), 80).await;
    assert!(matches!(result, Err(RecallError::NotFound { .. })));
}

#[tokio::test]
async fn test_daily_queue_mixes_due_reviews() {
    let h = Harness::new();
    let user = Uuid::new_v4();

    for _ in 0..20 {
        let item = Uuid::new_v4();
        h.register_review_exercise(item);
        h.record(user, item, &[20, 30, 10]).await;
    }

    let queue = h.service.daily_queue(user, new_candidates(5)).await.unwrap();

    use QueueSource::{New as N, Review as R};
    let order: Vec<QueueSource> = queue.entries.iter().map(|e| e.source).collect();
    assert_eq!(order, vec![N, R, N, R, N, R, N, N]);
    assert_eq!(queue.date, Utc::now().date_naive());
}

#[tokio::test]
async fn test_review_invalidates_cached_queue() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let item = Uuid::new_v4();
    let exercise = h.register_review_exercise(item);
    h.record(user, item, &[10, 20, 30]).await;

    let before = h.service.daily_queue(user, new_candidates(2)).await.unwrap();
    assert!(before.exercises().any(|e| *e == exercise));

    let key = CacheKey::DailyQueue {
        user_id: user,
        date: Utc::now().date_naive(),
    }
    .to_cache_key("recall");
    assert!(h.cache.get(&key).await.unwrap().is_some());

    // A good review pushes the item past today
    let mut weak = h.store.get(&user, &item).await.unwrap().unwrap();
    weak.review_interval = 2;
    h.store.upsert(weak).await.unwrap();
    let schedule = h.service.schedule_review(user, item, 85).await.unwrap();
    assert_eq!(schedule.interval, 6);
    assert!(h.cache.get(&key).await.unwrap().is_none());

    let after = h.service.daily_queue(user, new_candidates(2)).await.unwrap();
    assert_eq!(after.review_count(), 0);
    assert_eq!(after.len(), 2);
}

#[tokio::test]
async fn test_full_lifecycle_to_graduation() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let item = Uuid::new_v4();
    h.register_review_exercise(item);

    h.record(user, item, &[30, 40, 20]).await;
    let overview = h.service.overview(user).await.unwrap();
    assert_eq!(overview.tracked_items, 1);
    assert_eq!(overview.due_today, 1);

    let preview = h.service.preview_schedule(user, item).await.unwrap();
    assert_eq!(preview.again.interval, 1);

    // Two passing attempts are not enough yet
    h.record(user, item, &[95, 90]).await;
    assert!(!h.service.try_graduate(user, item).await.unwrap());

    h.record(user, item, &[100]).await;
    assert!(h.service.try_graduate(user, item).await.unwrap());
    assert!(h.store.get(&user, &item).await.unwrap().is_none());

    // Graduated items cannot be scheduled and graduating again is a no-op
    assert!(!h.service.try_graduate(user, item).await.unwrap());
    let result = h.service.schedule_review(user, item, 90).await;
    assert!(matches!(result, Err(RecallError::NotFound { .. })));

    let overview = h.service.overview(user).await.unwrap();
    assert_eq!(overview.tracked_items, 0);
}

#[tokio::test]
async fn test_low_recent_score_blocks_graduation() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let item = Uuid::new_v4();

    h.record(user, item, &[10, 20, 30, 100, 100, 100, 100, 60, 100, 100]).await;
    assert!(h.store.get(&user, &item).await.unwrap().is_some());
    assert!(!h.service.try_graduate(user, item).await.unwrap());
}

#[tokio::test]
async fn test_sweep_graduations() {
    let h = Harness::new();
    let user = Uuid::new_v4();
    let mastered = Uuid::new_v4();
    let weak = Uuid::new_v4();

    h.record(user, mastered, &[10, 20, 30, 90, 90, 90]).await;
    h.record(user, weak, &[10, 20, 30]).await;
    assert_eq!(h.store.list_for_user(&user).await.unwrap().len(), 2);

    let graduated = h.service.sweep_graduations(user).await.unwrap();
    assert_eq!(graduated, vec![mastered]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attempts_on_distinct_items() {
    let h = Harness::new();
    let service = Arc::new(h.service);
    let user = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let item = Uuid::new_v4();
            for score in [10u8, 20, 30] {
                let attempt = AttemptScore::new(user, item, score).unwrap();
                service.record_attempt(attempt).await.unwrap();
            }
            item
        }));
    }

    for handle in handles {
        let item = handle.await.unwrap();
        let weak = h.store.get(&user, &item).await.unwrap().unwrap();
        assert_eq!(weak.attempt_count, 3);
    }
    assert_eq!(h.store.total_count(), 16);
}
