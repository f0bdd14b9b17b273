//! # Recall Common
//!
//! Shared types, errors, and constants for the Recall spaced-repetition scheduler.
//!
//! ## Core Types
//!
//! - [`AttemptScore`]: one scored practice attempt, append-only
//! - [`WeakItem`]: a flagged (user, item) pair carrying SM-2 scheduling state
//! - [`ReviewSchedule`]: the outcome of one scheduling step
//! - [`DailyReviewQueue`]: the interleaved new/review session for one user and day
//!
//! ## Errors
//!
//! - [`RecallError`]: unified error returned by every scheduler operation
//! - [`StoreError`]/[`CacheError`]: failures reported by the storage collaborators

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{CacheError, RecallError, Result, StoreError};
pub use types::{
    attempt::AttemptScore,
    queue::{DailyReviewQueue, ExerciseRef, QueueEntry, QueueSource},
    schedule::{Quality, ReviewSchedule},
    weak_item::{ReviewOverview, WeakItem},
};

/// Recall version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Highest score an attempt can receive
pub const MAX_SCORE: u8 = 100;

/// Score at or above which an attempt counts as a success
pub const SUCCESS_THRESHOLD: u8 = 70;

/// Number of most-recent attempts the success rate is computed over
pub const SUCCESS_WINDOW: usize = 10;

/// Number of consecutive failures that flag an item regardless of its rate
pub const REPEATED_ERROR_WINDOW: usize = 3;

/// Lower bound of the SM-2 ease factor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Upper bound of the SM-2 ease factor
pub const MAX_EASE_FACTOR: f64 = 3.0;

/// Ease factor assigned to newly flagged items
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Review interval (days) assigned to newly flagged items
pub const INITIAL_INTERVAL_DAYS: u32 = 1;

/// Longest review interval (days) a schedule can produce
pub const MAX_INTERVAL_DAYS: u32 = 36_500;
