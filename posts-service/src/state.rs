//! Application state management

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::repository::{Delegate, Repository};

/// Application state shared across handlers
///
/// Generic over the datastore delegate so the same router runs on
/// PostgreSQL and in memory. Cloning is cheap: everything is behind `Arc`
/// or already reference counted.
pub struct AppState<D> {
    repository: Arc<Repository<D>>,
    config: Arc<Config>,
    db_pool: Option<PgPool>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: Arc::clone(&self.config),
            db_pool: self.db_pool.clone(),
        }
    }
}

impl<D: Delegate> AppState<D> {
    /// State over `delegate` with no pool attached
    pub fn new(config: Config, delegate: D) -> Self {
        Self {
            repository: Arc::new(Repository::new(delegate)),
            config: Arc::new(config),
            db_pool: None,
        }
    }

    /// Attach the pool readiness checks ping
    #[must_use]
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

impl<D> AppState<D> {
    /// Get the repository
    pub fn repository(&self) -> &Repository<D> {
        &self.repository
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the database pool, if the service runs on PostgreSQL
    ///
    /// `PgPool` is reference counted, so the clone is cheap.
    pub fn db(&self) -> Option<PgPool> {
        self.db_pool.clone()
    }
}
