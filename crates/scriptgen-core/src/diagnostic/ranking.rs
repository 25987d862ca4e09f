use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{confidence, Candidate};
use crate::error::ValidationError;

/// Order candidates by score, highest first. Ties keep report order.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

/// Which candidate, if any, the user has picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    Unselected,
    Selected(usize),
}

impl Selection {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Unselected => None,
            Self::Selected(index) => Some(index),
        }
    }

    /// Select `index` within a list of `len` candidates.
    ///
    /// Out-of-range indices (including negative ones) are rejected and the
    /// current selection is kept.
    pub fn select(&mut self, index: i64, len: usize) -> Result<usize, ValidationError> {
        let valid = usize::try_from(index).ok().filter(|i| *i < len);
        match valid {
            Some(i) => {
                *self = Self::Selected(i);
                Ok(i)
            }
            None => Err(ValidationError::CandidateOutOfRange { index, len }),
        }
    }

    /// Select the top candidate when its confidence reaches `threshold`.
    /// Returns whether a selection was made.
    pub fn auto_select(&mut self, ranked: &[Candidate], threshold: u8) -> bool {
        match ranked.first() {
            Some(top) if confidence(top.score) >= threshold => {
                debug!(selector = %top.selector, score = top.score, "auto-selected best candidate");
                *self = Self::Selected(0);
                true
            }
            _ => false,
        }
    }
}
