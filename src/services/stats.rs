//! Statistics service

use std::sync::Arc;

use crate::{
    api::stats::{LoanCounts, StatsResponse},
    clock::Clock,
    error::AppResult,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Snapshot counts of the catalog, registered users and loans.
    /// Reconciles loan statuses first so the overdue count is current.
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let today = self.clock.now().date_naive();
        self.repository.loans.mark_overdue(today, None).await?;

        let books = self.repository.books.count().await?;
        let users = self.repository.users.count().await?;
        let open = self.repository.loans.count_open().await?;
        let overdue = self.repository.loans.count_overdue().await?;

        Ok(StatsResponse {
            books,
            users,
            loans: LoanCounts { open, overdue },
        })
    }
}
