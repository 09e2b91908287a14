//! Libris Library Inventory Server
//!
//! Tracks books, copies and borrow/return transactions for a small library,
//! with role-gated access (Administrator, Library Staff, Student) over a REST
//! JSON API. The inventory coordinator in [`services::loans`] keeps catalog
//! availability and the loan ledger consistent.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
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

impl AppState {
    /// Connect the database, apply migrations, seed first-run data when
    /// enabled and wire up the services.
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        let pool = db::connect(&config.database).await?;
        let repository = repository::Repository::new(pool);

        if config.seed.enabled {
            services::seed::run(&repository).await?;
        }

        let services = services::Services::new(repository, &config);
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}
