//! Wiring of the catalog engine over the SQLite store.
//!
//! Both frontends (CLI and HTTP) build one [`CatalogService`] and call
//! through it, so they share clock, shuffler, and configured page sizes.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use catalog_core::aggregate::{Aggregator, Shuffler, ThreadRngShuffler};
use catalog_core::catalog::CatalogEngine;
use catalog_core::clock::{Clock, SystemClock};
use catalog_core::ledger::StatsLedger;

use crate::config::{CatalogConfig, Config};
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Clone)]
pub struct CatalogService {
    pub store: Arc<SqliteStore>,
    pub catalog: CatalogEngine<SqliteStore>,
    pub ledger: StatsLedger<SqliteStore>,
    pub aggregator: Aggregator<SqliteStore>,
}

impl CatalogService {
    pub fn new(
        pool: SqlitePool,
        config: &CatalogConfig,
        clock: Arc<dyn Clock>,
        shuffler: Arc<dyn Shuffler>,
    ) -> Self {
        let store = Arc::new(SqliteStore::new(pool));
        let ledger = StatsLedger::new(store.clone(), clock)
            .with_max_attempts(config.like_max_attempts);
        let catalog = CatalogEngine::new(store.clone(), ledger.clone())
            .with_default_page_size(config.default_page_size);
        let aggregator = Aggregator::new(store.clone(), shuffler)
            .with_page_sizes(config.default_page_size, config.related_page_size);
        Self {
            store,
            catalog,
            ledger,
            aggregator,
        }
    }

    /// Connects to the configured database with the wall clock and a
    /// thread-RNG shuffler.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self::new(
            pool,
            &config.catalog,
            Arc::new(SystemClock),
            Arc::new(ThreadRngShuffler),
        ))
    }

    pub async fn close(&self) {
        self.store.pool().close().await;
    }
}
