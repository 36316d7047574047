//! # Database Migrations
//!
//! Embedded SQL migrations for the local store.
//!
//! The `sqlx::migrate!()` macro embeds every file from `migrations/sqlite`
//! into the binary at compile time; at startup pending ones run in filename
//! order and are recorded in `_sqlx_migrations`. Never modify an existing
//! migration file, always add a new one.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}
