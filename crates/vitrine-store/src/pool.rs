//! # Local Store Handle
//!
//! Connection pool creation and configuration for the on-device SQLite
//! database, plus accessors for the per-collection repositories.
//!
//! ## Durability Contract
//! Every repository write is awaited to completion against the database
//! before the call returns, so a successful return means the mutation is
//! durable and immediately visible to subsequent reads on the same store
//! (read-your-writes). WAL mode keeps readers and writers from blocking
//! each other.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::repository::movement::MovementRepository;
use crate::repository::product::ProductRepository;
use crate::repository::queue::QueueRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::settings::SettingsRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Local store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    pub min_connections: u32,

    /// Connection acquire timeout.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    pub run_migrations: bool,
}

impl StoreConfig {
    /// Creates a configuration for the given database path. The file is
    /// created on first connect if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Creates an in-memory store configuration (for tests).
    ///
    /// In-memory databases live and die with their single connection, so
    /// the pool is pinned to one.
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Local Store
// =============================================================================

/// Handle to the on-device store. Cheap to clone; all clones share one pool.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Opens the store: creates the file if missing, configures SQLite
    /// (WAL, NORMAL synchronous, foreign keys), builds the pool, and runs
    /// migrations when enabled.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        info!(path = %config.database_path.display(), "Opening local store");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Store pool created");

        let store = LocalStore { pool };

        if config.run_migrations {
            migrations::run_migrations(&store.pool).await?;
        }

        Ok(store)
    }

    /// Opens an in-memory store with migrations applied (for tests).
    pub async fn open_in_memory() -> StoreResult<Self> {
        LocalStore::open(StoreConfig::in_memory()).await
    }

    /// Returns a reference to the connection pool for advanced queries.
    /// Prefer the repository accessors.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the pending-queue repository.
    pub fn queue(&self) -> QueueRepository {
        QueueRepository::new(self.pool.clone())
    }

    /// Returns the stock-movement repository.
    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.pool.clone())
    }

    /// Returns the settings repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Checks whether the store can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes the connection pool. Repository operations fail afterwards.
    pub async fn close(&self) {
        info!("Closing local store");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = LocalStore::open_in_memory().await.unwrap();
        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = StoreConfig::new("/tmp/vitrine-test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }
}
