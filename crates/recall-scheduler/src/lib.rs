//! # Recall Scheduler
//!
//! Spaced-repetition scheduling for vocabulary practice.
//!
//! ## Flow
//!
//! ```text
//! attempt ──► SuccessRateTracker ──(weak?)──► WeakItemClassifier ──► WeakItemStore
//!                                                                        │
//! review  ──► ReviewScheduler (SM-2) ── update ──────────────────────────┤
//!                 └── invalidate daily queue ──► ReviewCache             │
//!                                                    ▲                   │
//! session ──► DailyReviewComposer ── memoize ────────┘◄── due items ─────┤
//!                                                                        │
//! mastery ──► GraduationEvaluator ── delete ─────────────────────────────┘
//! ```
//!
//! Every operation is a request-scoped async call against the collaborator
//! traits in [`infra`]; the crate keeps no process-wide state. Concurrent
//! updates of the same (user, item) pair are last-write-wins at the store.

pub mod config;
pub mod domain;
pub mod infra;
pub mod service;
pub mod telemetry;

// Re-export core types
pub use config::{SchedulerConfig, SchedulingSettings};
pub use domain::classifier::WeakItemClassifier;
pub use domain::composer::{DailyReviewComposer, SlotPlan};
pub use domain::graduation::GraduationEvaluator;
pub use domain::scheduler::{compute_schedule, ReviewScheduler, SchedulePreview};
pub use domain::success_rate::{SuccessRateReport, SuccessRateTracker};
pub use service::ReviewService;

// Re-export infrastructure
pub use infra::exercise_resolver::{ExerciseResolver, StaticExerciseResolver};
pub use infra::history_store::{InMemoryHistoryStore, PerformanceHistoryStore};
pub use infra::redis_cache::RedisReviewCache;
pub use infra::review_cache::{CacheKey, InMemoryReviewCache, ReviewCache};
pub use infra::weak_item_store::{InMemoryWeakItemStore, WeakItemStore};

/// Success rate below which an item is flagged as weak
pub const WEAK_RATE_THRESHOLD: f64 = 70.0;

/// Ease factor subtracted on a failed recall
pub const FAILURE_EASE_PENALTY: f64 = 0.2;

/// Minimum number of slots in a daily session
pub const MIN_SESSION_SIZE: usize = 10;

/// Maximum share of a daily session given to reviews, in percent
pub const REVIEW_SHARE_PERCENT: u32 = 30;

/// Most-recent attempts considered for graduation
pub const GRADUATION_WINDOW: usize = 3;

/// Mean score required across the graduation window
pub const GRADUATION_MIN_MEAN: f64 = 85.0;

/// TTL of a composed daily queue (24 hours)
pub const DAILY_QUEUE_TTL_SECS: u64 = 86_400;

/// TTL of a cached per-item schedule (1 hour)
pub const SCHEDULE_TTL_SECS: u64 = 3_600;

/// Prefix of every cache key
pub const DEFAULT_CACHE_PREFIX: &str = "recall";
