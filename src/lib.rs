//! Local Library catalog server
//!
//! Browsing of books, authors and copies, librarian return and renewal
//! workflows, and catalog management, served as a JSON API.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
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

impl AppState {
    /// Wire repositories and services over a pool and a session store
    pub fn new(
        config: AppConfig,
        pool: Pool<Postgres>,
        session_store: Arc<dyn services::sessions::SessionStore>,
    ) -> Self {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(
            repository,
            config.auth.clone(),
            &config.catalog,
            session_store,
        );

        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
