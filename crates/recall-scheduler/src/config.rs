//! Scheduler configuration

use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Success-rate tracking and weak-item flagging
    pub tracking: TrackingSettings,
    /// SM-2 ease bounds and interval cap
    pub scheduling: SchedulingSettings,
    /// Daily queue composition
    pub composition: CompositionSettings,
    /// Graduation criteria
    pub graduation: GraduationSettings,
    /// Cache backend and TTLs
    pub cache: CacheSettings,
}

impl SchedulerConfig {
    /// Load configuration from `.env` and `RECALL_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        // Tracking settings
        override_from_env(&mut cfg.tracking.window, "RECALL_TRACKING_WINDOW");
        override_from_env(&mut cfg.tracking.success_score, "RECALL_TRACKING_SUCCESS_SCORE");
        override_from_env(
            &mut cfg.tracking.weak_rate_threshold,
            "RECALL_TRACKING_WEAK_RATE_THRESHOLD",
        );
        override_from_env(
            &mut cfg.tracking.repeated_error_window,
            "RECALL_TRACKING_REPEATED_ERROR_WINDOW",
        );

        // Scheduling settings
        override_from_env(&mut cfg.scheduling.min_ease, "RECALL_SCHEDULING_MIN_EASE");
        override_from_env(&mut cfg.scheduling.max_ease, "RECALL_SCHEDULING_MAX_EASE");
        override_from_env(&mut cfg.scheduling.default_ease, "RECALL_SCHEDULING_DEFAULT_EASE");
        override_from_env(
            &mut cfg.scheduling.failure_penalty,
            "RECALL_SCHEDULING_FAILURE_PENALTY",
        );
        override_from_env(
            &mut cfg.scheduling.max_interval_days,
            "RECALL_SCHEDULING_MAX_INTERVAL_DAYS",
        );

        // Composition settings
        override_from_env(
            &mut cfg.composition.min_session_size,
            "RECALL_COMPOSITION_MIN_SESSION_SIZE",
        );
        override_from_env(
            &mut cfg.composition.review_share_percent,
            "RECALL_COMPOSITION_REVIEW_SHARE_PERCENT",
        );

        // Graduation settings
        override_from_env(&mut cfg.graduation.window, "RECALL_GRADUATION_WINDOW");
        override_from_env(&mut cfg.graduation.min_score, "RECALL_GRADUATION_MIN_SCORE");
        override_from_env(&mut cfg.graduation.min_mean, "RECALL_GRADUATION_MIN_MEAN");

        // Cache settings
        if let Ok(url) = std::env::var("RECALL_REDIS_URL") {
            if !url.is_empty() {
                cfg.cache.redis_url = Some(url);
            }
        }
        if let Ok(prefix) = std::env::var("RECALL_CACHE_PREFIX") {
            cfg.cache.key_prefix = prefix;
        }
        override_from_env(
            &mut cfg.cache.daily_queue_ttl_secs,
            "RECALL_CACHE_DAILY_QUEUE_TTL_SECS",
        );
        override_from_env(&mut cfg.cache.schedule_ttl_secs, "RECALL_CACHE_SCHEDULE_TTL_SECS");
        override_from_env(
            &mut cfg.cache.max_in_memory_entries,
            "RECALL_CACHE_MAX_IN_MEMORY_ENTRIES",
        );

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would break the scheduler's invariants
    pub fn validate(&self) -> Result<()> {
        if self.tracking.window == 0 {
            bail!("tracking.window must be at least 1");
        }
        if self.tracking.repeated_error_window == 0 {
            bail!("tracking.repeated_error_window must be at least 1");
        }
        if self.tracking.success_score > recall_common::MAX_SCORE {
            bail!("tracking.success_score must be within 0..=100");
        }
        if !(0.0..=100.0).contains(&self.tracking.weak_rate_threshold) {
            bail!("tracking.weak_rate_threshold must be within 0..=100");
        }
        let scheduling = &self.scheduling;
        if scheduling.min_ease > scheduling.max_ease {
            bail!("scheduling.min_ease must not exceed scheduling.max_ease");
        }
        if scheduling.min_ease < recall_common::MIN_EASE_FACTOR
            || scheduling.max_ease > recall_common::MAX_EASE_FACTOR
        {
            bail!(
                "scheduling ease bounds must lie within {}..={}",
                recall_common::MIN_EASE_FACTOR,
                recall_common::MAX_EASE_FACTOR
            );
        }
        if !(scheduling.min_ease..=scheduling.max_ease).contains(&scheduling.default_ease) {
            bail!("scheduling.default_ease must lie within the ease bounds");
        }
        if scheduling.failure_penalty.is_nan() || scheduling.failure_penalty < 0.0 {
            bail!("scheduling.failure_penalty must not be negative");
        }
        if !(1..=recall_common::MAX_INTERVAL_DAYS).contains(&scheduling.max_interval_days) {
            bail!(
                "scheduling.max_interval_days must be within 1..={}",
                recall_common::MAX_INTERVAL_DAYS
            );
        }
        if self.composition.min_session_size == 0 {
            bail!("composition.min_session_size must be at least 1");
        }
        if self.composition.review_share_percent == 0 || self.composition.review_share_percent > 100 {
            bail!("composition.review_share_percent must be within 1..=100");
        }
        if self.graduation.window == 0 {
            bail!("graduation.window must be at least 1");
        }
        if self.graduation.min_score > recall_common::MAX_SCORE {
            bail!("graduation.min_score must be within 0..=100");
        }
        if self.cache.key_prefix.is_empty() {
            bail!("cache.key_prefix must not be empty");
        }
        Ok(())
    }
}

/// Success-rate tracking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Most-recent attempts the success rate is computed over
    pub window: usize,
    /// Score at or above which an attempt is a success
    pub success_score: u8,
    /// Items with a success rate below this are flagged
    pub weak_rate_threshold: f64,
    /// Consecutive failed attempts that flag an item
    pub repeated_error_window: usize,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            window: recall_common::SUCCESS_WINDOW,
            success_score: recall_common::SUCCESS_THRESHOLD,
            weak_rate_threshold: crate::WEAK_RATE_THRESHOLD,
            repeated_error_window: recall_common::REPEATED_ERROR_WINDOW,
        }
    }
}

/// SM-2 scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingSettings {
    /// Lowest ease factor a review can leave behind
    pub min_ease: f64,
    /// Highest ease factor a review can leave behind
    pub max_ease: f64,
    /// Ease factor of newly flagged items
    pub default_ease: f64,
    /// Ease factor subtracted on a failed recall
    pub failure_penalty: f64,
    /// Longest interval (days) a successful review can reach
    pub max_interval_days: u32,
}

impl SchedulingSettings {
    /// Clamp an ease factor into the configured bounds
    pub fn clamp_ease(&self, ease_factor: f64) -> f64 {
        ease_factor.max(self.min_ease).min(self.max_ease)
    }
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            min_ease: recall_common::MIN_EASE_FACTOR,
            max_ease: recall_common::MAX_EASE_FACTOR,
            default_ease: recall_common::DEFAULT_EASE_FACTOR,
            failure_penalty: crate::FAILURE_EASE_PENALTY,
            max_interval_days: recall_common::MAX_INTERVAL_DAYS,
        }
    }
}

/// Daily queue composition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionSettings {
    /// Minimum number of slots in a session
    pub min_session_size: usize,
    /// Maximum share of a session given to reviews, in percent (rounded up)
    pub review_share_percent: u32,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            min_session_size: crate::MIN_SESSION_SIZE,
            review_share_percent: crate::REVIEW_SHARE_PERCENT,
        }
    }
}

/// Graduation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationSettings {
    /// Most-recent attempts that must all pass
    pub window: usize,
    /// Lowest score allowed inside the window
    pub min_score: u8,
    /// Lowest mean score allowed across the window
    pub min_mean: f64,
}

impl Default for GraduationSettings {
    fn default() -> Self {
        Self {
            window: crate::GRADUATION_WINDOW,
            min_score: recall_common::SUCCESS_THRESHOLD,
            min_mean: crate::GRADUATION_MIN_MEAN,
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Redis URL (in-memory cache when absent)
    pub redis_url: Option<String>,
    /// Prefix for every cache key
    pub key_prefix: String,
    /// TTL of composed daily queues
    pub daily_queue_ttl_secs: u64,
    /// TTL of per-item schedules
    pub schedule_ttl_secs: u64,
    /// Capacity of the in-memory fallback cache
    pub max_in_memory_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: crate::DEFAULT_CACHE_PREFIX.to_string(),
            daily_queue_ttl_secs: crate::DAILY_QUEUE_TTL_SECS,
            schedule_ttl_secs: crate::SCHEDULE_TTL_SECS,
            max_in_memory_entries: 10_000,
        }
    }
}

fn override_from_env<T: FromStr>(target: &mut T, key: &str) {
    if let Ok(val) = std::env::var(key) {
        if let Ok(v) = val.parse() {
            *target = v;
        }
    }
}
