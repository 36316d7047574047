//! # Sale Repository
//!
//! Local-store operations for sales, including the stock pairing.
//!
//! ## The Pairing Invariant
//! Recording a `Completed` sale decrements the stock of every referenced
//! product; cancelling it re-increments the same quantities. Each pairing
//! runs inside ONE SQLite transaction together with its audit movements, so
//! it either applies completely or not at all. A sale can never exist
//! without its stock effect, and stock can never move without its sale.

use chrono::{DateTime, Datelike, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repository::movement::insert_movement;
use vitrine_core::{
    Money, MovementKind, PaymentMethod, Rate, Sale, SaleItem, SaleStatus, StockMovement, SyncState,
};

/// Filter for sale listings.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Calendar month index 0-11 of the sale timestamp (UTC).
    pub month: Option<u32>,

    /// Only this status.
    pub status: Option<SaleStatus>,
}

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by id.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Sale>> {
        let row = sqlx::query("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| sale_from_row(&r)).transpose()
    }

    /// Lists sales matching the filter, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        let rows = match filter.status {
            Some(status) => {
                sqlx::query("SELECT * FROM sales WHERE status = ?1 ORDER BY timestamp DESC")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM sales ORDER BY timestamp DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut sales: Vec<Sale> = rows
            .iter()
            .map(sale_from_row)
            .collect::<StoreResult<_>>()?;

        if let Some(month) = filter.month {
            sales.retain(|s| s.timestamp.month0() == month);
        }

        Ok(sales)
    }

    /// Records a sale. For a `Completed` sale, decrements the stock of every
    /// referenced product and appends the Exit movements, all in one
    /// transaction; a missing product aborts the whole sale.
    ///
    /// Returns the movements that were applied (empty for non-completed).
    pub async fn record(&self, sale: &Sale) -> StoreResult<Vec<StockMovement>> {
        debug!(id = %sale.id, total = %sale.total_amount, "Recording sale");

        let mut tx = self.pool.begin().await?;

        insert_sale(&mut tx, sale).await?;

        let mut movements = Vec::new();
        if sale.status == SaleStatus::Completed {
            for item in &sale.items {
                let movement = apply_stock_delta(
                    &mut tx,
                    &item.product_id,
                    -item.quantity,
                    MovementKind::Exit,
                    &format!("sale {}", sale.id),
                )
                .await?;
                movements.push(movement);
            }
        }

        tx.commit().await?;

        Ok(movements)
    }

    /// Cancels a `Completed` sale: flips the status and re-increments the
    /// stock of every referenced product in one transaction.
    ///
    /// Returns the updated sale and the Entry movements.
    pub async fn cancel(&self, sale_id: &str) -> StoreResult<(Sale, Vec<StockMovement>)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM sales WHERE id = ?1")
            .bind(sale_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found("Sale", sale_id))?;

        let mut sale = sale_from_row(&row)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'cancelled',
                updated_at = ?2,
                sync_state = 'pending'
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvalidState {
                entity: "Sale".to_string(),
                id: sale_id.to_string(),
                state: sale.status.as_str().to_string(),
            });
        }

        let mut movements = Vec::new();
        for item in &sale.items {
            let movement = apply_stock_delta(
                &mut tx,
                &item.product_id,
                item.quantity,
                MovementKind::Entry,
                &format!("cancellation of sale {}", sale_id),
            )
            .await?;
            movements.push(movement);
        }

        tx.commit().await?;

        sale.status = SaleStatus::Cancelled;
        sale.updated_at = now;
        sale.sync_state = SyncState::Pending;

        Ok((sale, movements))
    }

    /// Marks a sale's local revision as acknowledged by the remote store.
    pub async fn mark_synced(&self, id: &str) -> StoreResult<()> {
        sqlx::query("UPDATE sales SET sync_state = 'synced' WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Upserts a sale row without touching stock. Used by reconciliation
    /// pulls, where the stock effect already happened when the sale was
    /// first recorded (here or on another terminal).
    pub async fn upsert(&self, sale: &Sale) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        upsert_sale(&mut tx, sale).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Inserts the sale row.
async fn insert_sale(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, items, subtotal_cents, discount_cents, discount_bps, fees_cents,
            total_cents, payment_method, status, timestamp,
            created_at, updated_at, sync_state
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(serde_json::to_string(&sale.items)?)
    .bind(sale.subtotal.cents())
    .bind(sale.discount_amount.cents())
    .bind(sale.discount_percent.bps())
    .bind(sale.fees.cents())
    .bind(sale.total_amount.cents())
    .bind(sale.payment_method.as_str())
    .bind(sale.status.as_str())
    .bind(sale.timestamp)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.sync_state.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Upserts the sale row by id.
async fn upsert_sale(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, items, subtotal_cents, discount_cents, discount_bps, fees_cents,
            total_cents, payment_method, status, timestamp,
            created_at, updated_at, sync_state
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(id) DO UPDATE SET
            items = excluded.items,
            subtotal_cents = excluded.subtotal_cents,
            discount_cents = excluded.discount_cents,
            discount_bps = excluded.discount_bps,
            fees_cents = excluded.fees_cents,
            total_cents = excluded.total_cents,
            payment_method = excluded.payment_method,
            status = excluded.status,
            timestamp = excluded.timestamp,
            updated_at = excluded.updated_at,
            sync_state = excluded.sync_state
        "#,
    )
    .bind(&sale.id)
    .bind(serde_json::to_string(&sale.items)?)
    .bind(sale.subtotal.cents())
    .bind(sale.discount_amount.cents())
    .bind(sale.discount_percent.bps())
    .bind(sale.fees.cents())
    .bind(sale.total_amount.cents())
    .bind(sale.payment_method.as_str())
    .bind(sale.status.as_str())
    .bind(sale.timestamp)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.sync_state.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// In-database stock delta with its movement row, inside the caller's
/// transaction. Same RETURNING pattern as `ProductRepository::adjust_stock`.
async fn apply_stock_delta(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    delta: i64,
    kind: MovementKind,
    reason: &str,
) -> StoreResult<StockMovement> {
    let now = Utc::now();

    let row = sqlx::query(
        r#"
        UPDATE products SET
            stock_quantity = stock_quantity + ?1,
            updated_at = ?2,
            sync_state = 'pending'
        WHERE id = ?3
        RETURNING name, stock_quantity
        "#,
    )
    .bind(delta)
    .bind(now)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| StoreError::not_found("Product", product_id))?;

    let name: String = row.try_get("name")?;
    let after: i64 = row.try_get("stock_quantity")?;

    if after < 0 {
        warn!(id = %product_id, stock = after, "Stock went negative");
    }

    let movement = StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        product_name: name,
        kind,
        quantity: delta.abs(),
        balance_before: after - delta,
        balance_after: after,
        reason: Some(reason.to_string()),
        timestamp: now,
    };

    insert_movement(&mut **tx, &movement).await?;

    Ok(movement)
}

/// Decodes a sale row, including the items JSON column.
pub(crate) fn sale_from_row(row: &SqliteRow) -> StoreResult<Sale> {
    let items_json: String = row.try_get("items")?;
    let items: Vec<SaleItem> = serde_json::from_str(&items_json)?;

    let payment_method: String = row.try_get("payment_method")?;
    let status: String = row.try_get("status")?;
    let sync_state: String = row.try_get("sync_state")?;

    Ok(Sale {
        id: row.try_get("id")?,
        items,
        subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        discount_amount: Money::from_cents(row.try_get("discount_cents")?),
        discount_percent: Rate::from_bps(row.try_get::<i64, _>("discount_bps")? as u32),
        fees: Money::from_cents(row.try_get("fees_cents")?),
        total_amount: Money::from_cents(row.try_get("total_cents")?),
        payment_method: payment_method
            .parse::<PaymentMethod>()
            .map_err(StoreError::decode)?,
        status: status.parse::<SaleStatus>().map_err(StoreError::decode)?,
        timestamp: row.try_get::<DateTime<Utc>, _>("timestamp")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        sync_state: sync_state.parse::<SyncState>().map_err(StoreError::decode)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalStore;
    use crate::repository::product::ProductFilter;
    use vitrine_core::{Category, Product, DEFAULT_MIN_STOCK};

    fn sample_product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: "Batom Matte".to_string(),
            code: "MQ-BM-0001".to_string(),
            category: Category::Maquiagem,
            brand: None,
            cost: Money::from_cents(1050),
            suggested_price: Money::from_cents(2500),
            stock_quantity: stock,
            min_stock_threshold: DEFAULT_MIN_STOCK,
            description: None,
            supplier: None,
            location: None,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        }
    }

    fn sample_sale(id: &str, product_id: &str, quantity: i64) -> Sale {
        let now = Utc::now();
        let item = SaleItem::new(product_id, "Batom Matte", Money::from_cents(2500), quantity);
        let subtotal = item.subtotal;
        Sale {
            id: id.to_string(),
            items: vec![item],
            subtotal,
            discount_amount: Money::zero(),
            discount_percent: Rate::zero(),
            fees: Money::zero(),
            total_amount: subtotal,
            payment_method: PaymentMethod::Pix,
            status: SaleStatus::Completed,
            timestamp: now,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        }
    }

    #[tokio::test]
    async fn test_record_completed_sale_decrements_stock() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.products().upsert(&sample_product("p1", 10)).await.unwrap();

        let movements = store.sales().record(&sample_sale("s1", "p1", 3)).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].balance_after, 7);

        let product = store.products().get("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 7);

        let sale = store.sales().get("s1").await.unwrap().unwrap();
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.total_amount.cents(), 7500);
    }

    #[tokio::test]
    async fn test_record_pending_sale_leaves_stock_alone() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.products().upsert(&sample_product("p1", 10)).await.unwrap();

        let mut sale = sample_sale("s1", "p1", 3);
        sale.status = SaleStatus::Pending;
        let movements = store.sales().record(&sale).await.unwrap();
        assert!(movements.is_empty());

        let product = store.products().get("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_record_with_missing_product_applies_nothing() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.products().upsert(&sample_product("p1", 10)).await.unwrap();

        // Second item references a product that does not exist.
        let mut sale = sample_sale("s1", "p1", 3);
        sale.items.push(SaleItem::new("ghost", "Fantasma", Money::from_cents(100), 1));

        let err = store.sales().record(&sale).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        // Neither the sale row nor the first item's decrement survived.
        assert!(store.sales().get("s1").await.unwrap().is_none());
        let product = store.products().get("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
        assert_eq!(store.movements().recent(50).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.products().upsert(&sample_product("p1", 10)).await.unwrap();
        store.sales().record(&sample_sale("s1", "p1", 4)).await.unwrap();

        let (cancelled, movements) = store.sales().cancel("s1").await.unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Entry);

        let product = store.products().get("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_cancel_twice_rejected() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.products().upsert(&sample_product("p1", 10)).await.unwrap();
        store.sales().record(&sample_sale("s1", "p1", 4)).await.unwrap();

        store.sales().cancel("s1").await.unwrap();
        let err = store.sales().cancel("s1").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { .. }));

        // Stock restored once, not twice.
        let product = store.products().get("p1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.products().upsert(&sample_product("p1", 20)).await.unwrap();
        store.sales().record(&sample_sale("s1", "p1", 1)).await.unwrap();
        store.sales().record(&sample_sale("s2", "p1", 2)).await.unwrap();
        store.sales().cancel("s2").await.unwrap();

        let completed = store
            .sales()
            .list(&SaleFilter {
                status: Some(SaleStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, "s1");

        let all = store.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        // Products listing still works alongside (smoke for cross-table state).
        assert_eq!(store.products().list(&ProductFilter::default()).await.unwrap().len(), 1);
    }
}
