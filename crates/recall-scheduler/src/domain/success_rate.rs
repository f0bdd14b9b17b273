//! Success-rate tracking
//!
//! The success rate of a (user, item) pair is always recomputed from the most
//! recent attempts, never averaged incrementally:
//!
//! ```text
//! rate = 100 × |{score ≥ 70}| / |considered|,   considered = min(10, |history|)
//! ```
//!
//! An item is flagged as weak when its rate drops below 70 or when its three
//! most recent attempts all failed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use recall_common::{AttemptScore, RecallError, Result, MAX_SCORE};

use super::classifier::WeakItemClassifier;
use crate::config::TrackingSettings;
use crate::infra::history_store::PerformanceHistoryStore;

/// Outcome of one tracking pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRateReport {
    /// Success rate (0-100) over the considered attempts
    pub success_rate: f64,
    /// Attempts the rate was computed over
    pub attempts_considered: usize,
    /// Whether the most recent attempts all failed
    pub repeated_errors: bool,
    /// Whether the item was handed to the classifier
    pub flagged: bool,
}

/// Percentage of successful attempts, 0 for an empty history
pub fn success_rate(recent: &[AttemptScore], success_score: u8) -> f64 {
    if recent.is_empty() {
        return 0.0;
    }
    let successes = recent.iter().filter(|a| a.score >= success_score).count();
    100.0 * successes as f64 / recent.len() as f64
}

/// Whether the `window` newest attempts all failed
///
/// Histories shorter than the window never count as repeated errors.
pub fn has_repeated_errors(recent_newest_first: &[AttemptScore], window: usize, success_score: u8) -> bool {
    recent_newest_first.len() >= window
        && recent_newest_first[..window]
            .iter()
            .all(|a| a.score < success_score)
}

/// Computes rolling success rates and flags weak items
pub struct SuccessRateTracker {
    history: Arc<dyn PerformanceHistoryStore>,
    classifier: WeakItemClassifier,
    settings: TrackingSettings,
}

impl SuccessRateTracker {
    pub fn new(
        history: Arc<dyn PerformanceHistoryStore>,
        classifier: WeakItemClassifier,
        settings: TrackingSettings,
    ) -> Self {
        Self {
            history,
            classifier,
            settings,
        }
    }

    /// Recompute the success rate after an attempt and flag the item if weak
    ///
    /// `latest_score` must already be persisted in the history store.
    #[instrument(skip(self))]
    pub async fn track(&self, user_id: Uuid, item_id: Uuid, latest_score: u8) -> Result<SuccessRateReport> {
        if latest_score > MAX_SCORE {
            return Err(RecallError::score_out_of_range("score", latest_score));
        }

        let recent = self
            .history
            .recent(&user_id, &item_id, self.settings.window)
            .await?;

        let report = self.evaluate(&recent);
        debug!(
            success_rate = report.success_rate,
            considered = report.attempts_considered,
            repeated_errors = report.repeated_errors,
            "Computed success rate"
        );

        if report.flagged {
            info!(%user_id, %item_id, success_rate = report.success_rate, "Flagging weak item");
            self.classifier
                .classify(
                    user_id,
                    item_id,
                    report.success_rate,
                    report.attempts_considered as u32,
                )
                .await?;
        }

        Ok(report)
    }

    /// Evaluate a newest-first history without touching any store
    pub fn evaluate(&self, recent_newest_first: &[AttemptScore]) -> SuccessRateReport {
        let considered = &recent_newest_first[..recent_newest_first.len().min(self.settings.window)];
        let rate = success_rate(considered, self.settings.success_score);
        let repeated_errors = has_repeated_errors(
            considered,
            self.settings.repeated_error_window,
            self.settings.success_score,
        );

        SuccessRateReport {
            success_rate: rate,
            attempts_considered: considered.len(),
            repeated_errors,
            flagged: rate < self.settings.weak_rate_threshold || repeated_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::history_store::{InMemoryHistoryStore, MockPerformanceHistoryStore};
    use crate::infra::weak_item_store::{InMemoryWeakItemStore, WeakItemStore};
    use chrono::{Duration, Utc};
    use recall_common::StoreError;

    fn attempts(scores_oldest_first: &[u8]) -> Vec<AttemptScore> {
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();
        let start = Utc::now();
        let mut list: Vec<AttemptScore> = scores_oldest_first
            .iter()
            .enumerate()
            .map(|(i, s)| AttemptScore::at(user, item, *s, start + Duration::seconds(i as i64)).unwrap())
            .collect();
        list.reverse();
        list
    }

    fn tracker_with(
        history: Arc<dyn PerformanceHistoryStore>,
        store: Arc<dyn WeakItemStore>,
    ) -> SuccessRateTracker {
        SuccessRateTracker::new(
            history,
            WeakItemClassifier::new(store),
            TrackingSettings::default(),
        )
    }

    #[test]
    fn test_success_rate_empty_history() {
        assert_eq!(success_rate(&[], 70), 0.0);
    }

    #[test]
    fn test_success_rate_counts_threshold_as_success() {
        let recent = attempts(&[70, 69, 100, 0]);
        assert_eq!(success_rate(&recent, 70), 50.0);
    }

    #[test]
    fn test_repeated_errors_needs_full_window() {
        assert!(!has_repeated_errors(&attempts(&[10, 20]), 3, 70));
        assert!(has_repeated_errors(&attempts(&[90, 10, 20, 30]), 3, 70));
        assert!(!has_repeated_errors(&attempts(&[10, 20, 90]), 3, 70));
    }

    #[test]
    fn test_evaluate_considers_only_window() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(history, store);

        // Twelve attempts: the two oldest failures fall outside the window
        let recent = attempts(&[0, 0, 90, 90, 90, 90, 90, 90, 90, 90, 90, 90]);
        let report = tracker.evaluate(&recent);

        assert_eq!(report.attempts_considered, 10);
        assert_eq!(report.success_rate, 100.0);
        assert!(!report.flagged);
    }

    #[test]
    fn test_recent_failure_streak_flags_despite_high_rate() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(history, store);

        let recent = attempts(&[90, 90, 90, 90, 90, 90, 90, 10, 20, 30]);
        let report = tracker.evaluate(&recent);

        assert_eq!(report.success_rate, 70.0);
        assert!(report.repeated_errors);
        assert!(report.flagged);
    }

    #[tokio::test]
    async fn test_track_flags_and_classifies() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(history.clone(), store.clone());
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();

        for score in [30u8, 80, 40] {
            history.append(AttemptScore::new(user, item, score).unwrap()).await.unwrap();
        }

        let report = tracker.track(user, item, 40).await.unwrap();
        assert!(report.flagged);
        assert!((report.success_rate - 100.0 / 3.0).abs() < 1e-9);

        let weak = store.get(&user, &item).await.unwrap().unwrap();
        assert_eq!(weak.attempt_count, 3);
        assert!((weak.success_rate - report.success_rate).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_track_no_history_flags_with_zero_rate() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(history, store.clone());
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();

        let report = tracker.track(user, item, 90).await.unwrap();
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.attempts_considered, 0);
        assert!(!report.repeated_errors);
        assert!(report.flagged);
        assert!(store.get(&user, &item).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_track_strong_item_is_not_flagged() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(history.clone(), store.clone());
        let user = Uuid::new_v4();
        let item = Uuid::new_v4();

        for score in [85u8, 95, 75] {
            history.append(AttemptScore::new(user, item, score).unwrap()).await.unwrap();
        }

        let report = tracker.track(user, item, 75).await.unwrap();
        assert!(!report.flagged);
        assert!(store.get(&user, &item).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_track_rejects_out_of_range_score() {
        let history = Arc::new(InMemoryHistoryStore::new());
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(history, store);

        let result = tracker.track(Uuid::new_v4(), Uuid::new_v4(), 180).await;
        assert!(matches!(result, Err(RecallError::Validation(_))));
    }

    #[tokio::test]
    async fn test_track_propagates_store_failure() {
        let mut history = MockPerformanceHistoryStore::new();
        history
            .expect_recent()
            .returning(|_, _, _| Err(StoreError::Connection("refused".into())));
        let store = Arc::new(InMemoryWeakItemStore::new());
        let tracker = tracker_with(Arc::new(history), store);

        let result = tracker.track(Uuid::new_v4(), Uuid::new_v4(), 50).await;
        assert!(matches!(result, Err(RecallError::StoreUnavailable(_))));
    }

    proptest::proptest! {
        #[test]
        fn prop_rate_matches_definition(scores in proptest::collection::vec(0u8..=100, 0..=10)) {
            let recent = attempts(&scores);
            let successes = scores.iter().filter(|s| **s >= 70).count();
            let expected = if scores.is_empty() { 0.0 } else { 100.0 * successes as f64 / scores.len() as f64 };
            proptest::prop_assert!((success_rate(&recent, 70) - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_flag_iff_low_rate_or_streak(scores in proptest::collection::vec(0u8..=100, 0..=10)) {
            let history = Arc::new(InMemoryHistoryStore::new());
            let store = Arc::new(InMemoryWeakItemStore::new());
            let tracker = tracker_with(history, store);

            let recent = attempts(&scores);
            let report = tracker.evaluate(&recent);
            let streak = scores.len() >= 3 && scores[scores.len() - 3..].iter().all(|s| *s < 70);
            proptest::prop_assert_eq!(report.flagged, report.success_rate < 70.0 || streak);
            proptest::prop_assert_eq!(report.repeated_errors, streak);
        }
    }
}
