//! WeakItem - a (user, item) pair under spaced repetition
//!
//! Created the first time an item is classified as weak, mutated on every
//! scheduled review, and deleted on graduation. There is at most one per
//! (user, item) pair.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schedule::{clamp_ease, ReviewSchedule};
use crate::{DEFAULT_EASE_FACTOR, INITIAL_INTERVAL_DAYS};

/// Scheduling state of a flagged item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakItem {
    /// Record identifier
    pub id: Uuid,
    /// Learner
    pub user_id: Uuid,
    /// Vocabulary item (content id)
    pub item_id: Uuid,
    /// Rolling success rate (0-100) over the most recent attempts
    pub success_rate: f64,
    /// Attempts the success rate was computed over
    pub attempt_count: u32,
    /// Last attempt or review
    pub last_attempt: DateTime<Utc>,
    /// First day the item is due for review
    pub next_review: NaiveDate,
    /// Current interval in days (>= 1)
    pub review_interval: u32,
    /// SM-2 ease factor (1.3-3.0)
    pub ease_factor: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeakItem {
    /// Create a freshly flagged item, due on the day it was flagged
    pub fn new(
        user_id: Uuid,
        item_id: Uuid,
        success_rate: f64,
        attempt_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            item_id,
            success_rate,
            attempt_count,
            last_attempt: now,
            next_review: now.date_naive(),
            review_interval: INITIAL_INTERVAL_DAYS,
            ease_factor: DEFAULT_EASE_FACTOR,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh performance figures after a new attempt
    ///
    /// `next_review` only moves forward to the attempt's day when it lies in the
    /// past, so the item stays due and never precedes `last_attempt`.
    pub fn record_performance(&mut self, success_rate: f64, attempt_count: u32, now: DateTime<Utc>) {
        self.success_rate = success_rate;
        self.attempt_count = attempt_count;
        self.last_attempt = now;
        self.next_review = self.next_review.max(now.date_naive());
        self.updated_at = now;
    }

    /// Apply a computed schedule
    pub fn apply_schedule(&mut self, schedule: &ReviewSchedule, now: DateTime<Utc>) {
        self.review_interval = schedule.interval.max(1);
        self.ease_factor = clamp_ease(schedule.ease_factor);
        self.next_review = schedule.next_review;
        self.last_attempt = now;
        self.updated_at = now;
    }

    /// Whether the item is due on `as_of`
    #[inline]
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.next_review <= as_of
    }

    /// Days past the due date (0 when not yet due)
    pub fn days_overdue(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.next_review).num_days().max(0)
    }
}

/// Summary of a learner's spaced-repetition backlog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOverview {
    pub user_id: Uuid,
    /// Items currently tracked as weak
    pub tracked_items: usize,
    /// Items due on the overview date
    pub due_today: usize,
    /// Mean ease factor across tracked items (0 when none)
    pub average_ease: f64,
    /// Mean success rate across tracked items (0 when none)
    pub average_success_rate: f64,
    pub as_of: NaiveDate,
}

impl ReviewOverview {
    /// Summarize a user's tracked items
    pub fn from_items(user_id: Uuid, items: &[WeakItem], as_of: NaiveDate) -> Self {
        let tracked = items.len();
        let (average_ease, average_success_rate) = if tracked == 0 {
            (0.0, 0.0)
        } else {
            let ease: f64 = items.iter().map(|i| i.ease_factor).sum();
            let rate: f64 = items.iter().map(|i| i.success_rate).sum();
            (ease / tracked as f64, rate / tracked as f64)
        };

        Self {
            user_id,
            tracked_items: tracked,
            due_today: items.iter().filter(|i| i.is_due(as_of)).count(),
            average_ease,
            average_success_rate,
            as_of,
        }
    }
}
