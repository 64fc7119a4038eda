//! Business logic services

pub mod borrowing;
pub mod catalog;
pub mod reconciler;
pub mod stats;
pub mod users;

use std::sync::Arc;

use crate::{clock::Clock, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub borrowing: borrowing::BorrowingService,
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub reconciler: reconciler::ReconcilerService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository and clock
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self {
            borrowing: borrowing::BorrowingService::new(repository.clone(), clock.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            reconciler: reconciler::ReconcilerService::new(repository.clone(), clock.clone()),
            stats: stats::StatsService::new(repository, clock),
        }
    }
}
