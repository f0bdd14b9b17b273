//! Daily review queue types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A displayable exercise
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseRef {
    /// Exercise identifier
    pub exercise_id: Uuid,
    /// Vocabulary item the exercise practices
    pub content_id: Uuid,
    /// Exercise kind (e.g. "translation", "listening")
    pub exercise_type: String,
}

impl ExerciseRef {
    pub fn new(exercise_id: Uuid, content_id: Uuid, exercise_type: impl Into<String>) -> Self {
        Self {
            exercise_id,
            content_id,
            exercise_type: exercise_type.into(),
        }
    }
}

/// Why an exercise is in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueSource {
    /// Fresh material supplied by the caller
    New,
    /// A due weak item
    Review,
}

/// One slot of the daily queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub exercise: ExerciseRef,
    pub source: QueueSource,
}

/// Interleaved session for one user and one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReviewQueue {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub entries: Vec<QueueEntry>,
    pub generated_at: DateTime<Utc>,
}

impl DailyReviewQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of review slots in the queue
    pub fn review_count(&self) -> usize {
        self.count(QueueSource::Review)
    }

    /// Number of new-material slots in the queue
    pub fn new_count(&self) -> usize {
        self.count(QueueSource::New)
    }

    /// Exercises in queue order
    pub fn exercises(&self) -> impl Iterator<Item = &ExerciseRef> {
        self.entries.iter().map(|e| &e.exercise)
    }

    fn count(&self, source: QueueSource) -> usize {
        self.entries.iter().filter(|e| e.source == source).count()
    }
}
