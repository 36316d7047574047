//! # Stock Movement Repository
//!
//! The append-only stock audit trail. Movement rows are written inside the
//! same transaction as the stock mutation they record (see the product and
//! sale repositories), so the trail never disagrees with the stock level.
//!
//! Storage is uncapped; only the display read window is limited.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::error::{StoreError, StoreResult};
use vitrine_core::{MovementKind, StockMovement};

/// Number of movements shown by the default display window.
pub const RECENT_WINDOW: u32 = 50;

/// Inserts a movement row through any executor, so callers can participate
/// in a surrounding transaction.
pub(crate) async fn insert_movement<'e, E>(executor: E, movement: &StockMovement) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, product_name, kind, quantity,
            balance_before, balance_after, reason, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.product_name)
    .bind(movement.kind.as_str())
    .bind(movement.quantity)
    .bind(movement.balance_before)
    .bind(movement.balance_after)
    .bind(&movement.reason)
    .bind(movement.timestamp)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for reading the stock audit trail.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Most recent movements, newest first.
    pub async fn recent(&self, limit: u32) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            "SELECT * FROM stock_movements ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(movement_from_row).collect()
    }

    /// All movements for one product, newest first.
    pub async fn for_product(&self, product_id: &str) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            "SELECT * FROM stock_movements WHERE product_id = ?1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(movement_from_row).collect()
    }

    /// Total number of stored movements (storage is uncapped).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn movement_from_row(row: &SqliteRow) -> StoreResult<StockMovement> {
    let kind: String = row.try_get("kind")?;

    Ok(StockMovement {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        product_name: row.try_get("product_name")?,
        kind: kind.parse::<MovementKind>().map_err(StoreError::decode)?,
        quantity: row.try_get("quantity")?,
        balance_before: row.try_get("balance_before")?,
        balance_after: row.try_get("balance_after")?,
        reason: row.try_get("reason")?,
        timestamp: row.try_get::<DateTime<Utc>, _>("timestamp")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalStore;
    use uuid::Uuid;

    fn movement(product_id: &str, after: i64) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            product_name: "Batom Matte".to_string(),
            kind: MovementKind::Entry,
            quantity: 1,
            balance_before: after - 1,
            balance_after: after,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_recent_window_caps_reads_not_storage() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let repo = store.movements();

        for i in 0..60 {
            insert_movement(store.pool(), &movement("p1", i + 1)).await.unwrap();
        }

        let window = repo.recent(RECENT_WINDOW).await.unwrap();
        assert_eq!(window.len(), 50);

        assert_eq!(repo.count().await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_for_product_filters() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let repo = store.movements();

        insert_movement(store.pool(), &movement("p1", 1)).await.unwrap();
        insert_movement(store.pool(), &movement("p2", 1)).await.unwrap();

        assert_eq!(repo.for_product("p1").await.unwrap().len(), 1);
        assert_eq!(repo.for_product("p3").await.unwrap().len(), 0);
    }
}
