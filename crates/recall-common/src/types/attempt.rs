//! AttemptScore - one scored practice attempt
//!
//! Attempts are immutable and appended to the performance history by the caller
//! (or by `ReviewService::record_attempt`). Every success-rate computation reads
//! them back newest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RecallError, Result, MAX_SCORE, SUCCESS_THRESHOLD};

/// A single scored practice attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptScore {
    /// Learner
    pub user_id: Uuid,
    /// Vocabulary item practiced
    pub item_id: Uuid,
    /// Score from 0 to 100
    pub score: u8,
    /// Transcript of what the learner produced, if any
    pub recognized_text: Option<String>,
    /// When the attempt happened
    pub timestamp: DateTime<Utc>,
}

impl AttemptScore {
    /// Create a new attempt stamped with the current time
    pub fn new(user_id: Uuid, item_id: Uuid, score: u8) -> Result<Self> {
        Self::at(user_id, item_id, score, Utc::now())
    }

    /// Create a new attempt at an explicit time
    pub fn at(user_id: Uuid, item_id: Uuid, score: u8, timestamp: DateTime<Utc>) -> Result<Self> {
        if score > MAX_SCORE {
            return Err(RecallError::score_out_of_range("score", score));
        }
        Ok(Self {
            user_id,
            item_id,
            score,
            recognized_text: None,
            timestamp,
        })
    }

    /// Attach the recognized transcript
    pub fn with_recognized_text(mut self, text: impl Into<String>) -> Self {
        self.recognized_text = Some(text.into());
        self
    }

    /// Whether this attempt counts as a success
    #[inline]
    pub fn is_success(&self) -> bool {
        self.score >= SUCCESS_THRESHOLD
    }
}
