//! Biblius Library Lending Management System
//!
//! A Rust REST API server for managing a library catalog, its users and the
//! borrowing lifecycle: every book's available-copy count stays consistent
//! with its open loan records, and loan statuses are reconciled over time.

use std::sync::Arc;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
