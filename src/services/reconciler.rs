//! Periodic overdue reconciliation.
//!
//! The lazy path (reconcile just before a status-exposing read) lives in
//! `BorrowingService`; both paths share the repository's `mark_overdue`
//! rule, so bulk overdue reporting never disagrees with per-read results.

use std::sync::Arc;
use std::time::Duration;

use crate::{clock::Clock, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct ReconcilerService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl ReconcilerService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Transition every past-due active loan to overdue
    pub async fn sweep(&self) -> AppResult<u64> {
        let today = self.clock.now().date_naive();
        let transitioned = self.repository.loans.mark_overdue(today, None).await?;

        if transitioned > 0 {
            tracing::info!(transitioned, "overdue sweep marked loans");
        } else {
            tracing::debug!("overdue sweep found nothing to do");
        }
        Ok(transitioned)
    }

    /// Run the sweep on a fixed interval; spawned at startup
    pub async fn run_periodic(self, interval_secs: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(err) = self.sweep().await {
                tracing::error!("overdue sweep failed: {}", err);
            }
        }
    }
}
