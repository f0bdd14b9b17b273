//! Review scheduling primitives
//!
//! SM-2 works on a 0-5 recall quality scale. Performances arrive on a 0-100
//! scale and are discretized with `floor(performance / 100 * 5)`:
//!
//! | performance | quality |
//! |-------------|---------|
//! | 0-19        | 0       |
//! | 20-39       | 1       |
//! | 40-59       | 2       |
//! | 60-79       | 3       |
//! | 80-99       | 4       |
//! | 100         | 5       |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RecallError, Result, MAX_EASE_FACTOR, MAX_SCORE, MIN_EASE_FACTOR};

/// SM-2 recall quality (0-5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quality(u8);

impl Quality {
    /// Highest quality (perfect recall)
    pub const PERFECT: Quality = Quality(5);

    /// Lowest quality counted as a successful recall
    pub const PASSING: Quality = Quality(3);

    /// Failed recall that was still attempted
    pub const AGAIN: Quality = Quality(1);

    /// Correct recall after hesitation
    pub const GOOD: Quality = Quality(4);

    /// Discretize a 0-100 performance
    pub fn from_performance(performance: u8) -> Result<Self> {
        if performance > MAX_SCORE {
            return Err(RecallError::score_out_of_range("performance", performance));
        }
        // Integer division is floor for non-negative operands
        Ok(Quality((performance as u16 * 5 / MAX_SCORE as u16) as u8))
    }

    /// Raw 0-5 value
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether the recall counts as successful (quality >= 3)
    #[inline]
    pub fn is_passing(self) -> bool {
        self >= Self::PASSING
    }
}

/// Computed schedule for one weak item
///
/// Materializes into the item's `next_review`, `review_interval` and
/// `ease_factor`; it is cached but never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSchedule {
    /// Vocabulary item the schedule applies to
    pub item_id: Uuid,
    /// First day the item is due again
    pub next_review: NaiveDate,
    /// Interval in days
    pub interval: u32,
    /// Updated ease factor
    pub ease_factor: f64,
    /// Quality the schedule was derived from
    pub quality: Quality,
}

/// Clamp an ease factor into the SM-2 bounds
#[inline]
pub fn clamp_ease(ease_factor: f64) -> f64 {
    ease_factor.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bands() {
        let cases = [(0, 0), (19, 0), (20, 1), (40, 2), (59, 2), (60, 3), (90, 4), (99, 4), (100, 5)];
        for (performance, expected) in cases {
            assert_eq!(
                Quality::from_performance(performance).unwrap().value(),
                expected,
                "performance {}",
                performance
            );
        }
    }

    #[test]
    fn test_quality_rejects_out_of_range() {
        assert!(Quality::from_performance(101).is_err());
    }

    #[test]
    fn test_passing() {
        assert!(!Quality::from_performance(59).unwrap().is_passing());
        assert!(Quality::from_performance(60).unwrap().is_passing());
        assert_eq!(Quality::from_performance(100).unwrap(), Quality::PERFECT);
    }

    #[test]
    fn test_named_qualities_match_bands() {
        assert_eq!(Quality::from_performance(20).unwrap(), Quality::AGAIN);
        assert_eq!(Quality::from_performance(60).unwrap(), Quality::PASSING);
        assert_eq!(Quality::from_performance(80).unwrap(), Quality::GOOD);
        assert!(!Quality::AGAIN.is_passing());
    }

    #[test]
    fn test_clamp_ease() {
        assert_eq!(clamp_ease(0.9), MIN_EASE_FACTOR);
        assert_eq!(clamp_ease(3.4), MAX_EASE_FACTOR);
        assert_eq!(clamp_ease(2.1), 2.1);
    }

    proptest::proptest! {
        #[test]
        fn prop_quality_matches_floor(performance in 0u8..=100) {
            let quality = Quality::from_performance(performance).unwrap();
            let expected = (performance as f64 * 5.0 / 100.0).floor() as u8;
            proptest::prop_assert_eq!(quality.value(), expected);
            proptest::prop_assert!(quality <= Quality::PERFECT);
        }
    }
}
