use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::templates::ScriptCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Done,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Pending => Self::Processing,
            Self::Processing | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Progress of one pass over every script category.
///
/// Each category moves `Pending -> Processing -> Done`. Once the run is
/// cancelled its statuses are frozen.
#[derive(Debug, Clone)]
pub struct BatchRun {
    statuses: [(ScriptCategory, BatchStatus); 5],
    cancel: CancellationToken,
}

impl BatchRun {
    pub fn start() -> Self {
        Self {
            statuses: ScriptCategory::ALL.map(|category| (category, BatchStatus::Pending)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn status(&self, category: ScriptCategory) -> BatchStatus {
        self.statuses
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, status)| *status)
            .unwrap_or(BatchStatus::Pending)
    }

    pub fn status_at(&self, index: usize) -> Option<(ScriptCategory, BatchStatus)> {
        self.statuses.get(index).copied()
    }

    pub fn statuses(&self) -> &[(ScriptCategory, BatchStatus)] {
        &self.statuses
    }

    /// Move `category` one step forward and return its new status. Cancelled
    /// runs and finished categories are left as they are.
    pub fn advance(&mut self, category: ScriptCategory) -> BatchStatus {
        let cancelled = self.is_cancelled();
        match self.statuses.iter_mut().find(|(c, _)| *c == category) {
            Some((_, status)) if !cancelled => {
                *status = status.next();
                debug!(%category, status = %status, "batch step");
                *status
            }
            Some((_, status)) => *status,
            None => BatchStatus::Pending,
        }
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("batch cancelled");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_complete(&self) -> bool {
        self.statuses.iter().all(|(_, s)| *s == BatchStatus::Done)
    }

    /// Token shared with whatever task drives the run.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_every_category_pending() {
        let run = BatchRun::start();
        assert_eq!(run.statuses().len(), 5);
        assert!(run
            .statuses()
            .iter()
            .all(|(_, s)| *s == BatchStatus::Pending));
        assert_eq!(
            run.status_at(4),
            Some((ScriptCategory::Total, BatchStatus::Pending))
        );
        assert_eq!(run.status_at(5), None);
    }

    #[test]
    fn advances_through_each_state_once() {
        let mut run = BatchRun::start();
        assert_eq!(run.advance(ScriptCategory::Cart), BatchStatus::Processing);
        assert_eq!(run.advance(ScriptCategory::Cart), BatchStatus::Done);
        assert_eq!(run.advance(ScriptCategory::Cart), BatchStatus::Done);
        assert_eq!(run.status(ScriptCategory::Payment), BatchStatus::Pending);
        assert!(!run.is_complete());

        for category in ScriptCategory::ALL {
            run.advance(category);
            run.advance(category);
        }
        assert!(run.is_complete());
    }

    #[test]
    fn cancelled_run_is_frozen() {
        let mut run = BatchRun::start();
        run.advance(ScriptCategory::Disable);
        let token = run.token();
        run.cancel();
        assert!(token.is_cancelled());
        assert_eq!(run.advance(ScriptCategory::Disable), BatchStatus::Processing);
        assert_eq!(run.advance(ScriptCategory::Cart), BatchStatus::Pending);
        assert!(run.is_cancelled());
    }

    #[tokio::test]
    async fn token_wakes_waiters_on_cancel() {
        let run = BatchRun::start();
        let token = run.token();
        let waiter = tokio::spawn(async move { token.cancelled().await });
        run.cancel();
        waiter.await.unwrap();
    }
}
