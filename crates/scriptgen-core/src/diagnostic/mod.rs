use serde::{Deserialize, Serialize};

pub mod parser;
pub mod ranking;

/// Confidence at or above which the top-ranked candidate is selected automatically.
pub const AUTO_SELECT_CONFIDENCE: u8 = 70;

/// A scored target location extracted from a diagnostic report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub selector: String,
    pub score: i64,
    pub details: Vec<String>,
}

impl Candidate {
    pub fn new(selector: impl Into<String>, score: i64, details: Vec<String>) -> Self {
        Self {
            selector: selector.into(),
            score,
            details,
        }
    }

    pub fn confidence(&self) -> u8 {
        confidence(self.score)
    }
}

/// Map a raw diagnostic score onto a confidence percentage.
///
/// Total over all integers; the result is always within `50..=95`.
pub fn confidence(score: i64) -> u8 {
    let value = if score >= 40 {
        score.saturating_add(70).min(95)
    } else if score >= 30 {
        score.saturating_add(60).min(85)
    } else if score >= 20 {
        score.saturating_add(50).min(75)
    } else {
        score.saturating_mul(2).max(50)
    };
    // every branch above lands in 50..=95
    value as u8
}

/// Qualitative buckets used when presenting confidence values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: u8) -> Self {
        if confidence >= 85 {
            Self::High
        } else if confidence >= 70 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn confidence_matches_reference_points() {
        assert_eq!(confidence(0), 50);
        assert_eq!(confidence(25), 75);
        assert_eq!(confidence(35), 85);
        assert_eq!(confidence(44), 95);
        assert_eq!(confidence(100), 95);
    }

    #[test]
    fn confidence_branch_edges() {
        assert_eq!(confidence(19), 50);
        assert_eq!(confidence(20), 70);
        assert_eq!(confidence(29), 75);
        assert_eq!(confidence(30), 85);
        assert_eq!(confidence(39), 85);
        assert_eq!(confidence(40), 95);
        assert_eq!(confidence(-40), 50);
        assert_eq!(confidence(i64::MIN), 50);
        assert_eq!(confidence(i64::MAX), 95);
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(ConfidenceBand::from_confidence(50), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_confidence(69), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_confidence(70), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(84), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(85), ConfidenceBand::High);
    }

    fn branch_of(score: i64) -> u8 {
        match score {
            s if s >= 40 => 3,
            s if s >= 30 => 2,
            s if s >= 20 => 1,
            _ => 0,
        }
    }

    proptest! {
        #[test]
        fn confidence_is_bounded(score in any::<i64>()) {
            let value = confidence(score);
            prop_assert!((50..=95).contains(&value));
        }

        #[test]
        fn confidence_is_monotonic_within_branch(a in -1000i64..1000, b in -1000i64..1000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if branch_of(lo) == branch_of(hi) {
                prop_assert!(confidence(lo) <= confidence(hi));
            }
        }
    }
}
