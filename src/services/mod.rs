//! Business logic services

pub mod catalog;
pub mod loans;
pub mod redis;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, CatalogConfig},
    models::book_instance::RenewalPolicy,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub sessions: sessions::SessionService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        catalog_config: &CatalogConfig,
        session_store: Arc<dyn sessions::SessionStore>,
    ) -> Self {
        let policy = RenewalPolicy {
            default_days: catalog_config.renewal_default_days,
            max_days: catalog_config.renewal_max_days,
        };

        Self {
            catalog: catalog::CatalogService::new(repository.clone(), catalog_config.paginate_by),
            loans: loans::LoansService::new(repository.clone(), catalog_config.paginate_by, policy),
            users: users::UsersService::new(repository.clone(), auth_config),
            sessions: sessions::SessionService::new(session_store),
            repository,
        }
    }

    /// Readiness check against the database
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
