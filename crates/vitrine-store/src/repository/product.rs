//! # Product Repository
//!
//! Local-store operations for products.
//!
//! ## Stock Arithmetic
//! Stock changes never read-modify-write in Rust. They run as
//! `SET stock_quantity = stock_quantity + ?` inside the database, so two
//! overlapping decrements serialize there and cannot lose an update
//! regardless of how their callers interleave.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repository::movement::insert_movement;
use vitrine_core::{Category, Money, MovementKind, Product, StockMovement, SyncState};

/// Filter for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Only this category.
    pub category: Option<Category>,

    /// Only products at or below their low-stock threshold (and not out).
    pub low_stock: bool,

    /// Case-insensitive substring match over name, code, brand, description.
    pub search: Option<String>,
}

/// Repository for product operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by id.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| product_from_row(&r)).transpose()
    }

    /// Lists products matching the filter, ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM products WHERE 1=1");

        if let Some(category) = filter.category {
            qb.push(" AND category = ");
            qb.push_bind(category.as_str());
        }

        if filter.low_stock {
            qb.push(" AND stock_quantity > 0 AND stock_quantity <= min_stock_threshold");
        }

        if let Some(search) = &filter.search {
            let like = format!("%{}%", search.to_lowercase());
            qb.push(" AND (lower(name) LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR lower(code) LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR lower(coalesce(brand, '')) LIKE ");
            qb.push_bind(like.clone());
            qb.push(" OR lower(coalesce(description, '')) LIKE ");
            qb.push_bind(like);
            qb.push(")");
        }

        qb.push(" ORDER BY name COLLATE NOCASE");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(product_from_row).collect()
    }

    /// Upserts a product by id.
    pub async fn upsert(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, code = %product.code, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, code, category, brand,
                cost_cents, suggested_price_cents, stock_quantity, min_stock_threshold,
                description, supplier, location,
                created_at, updated_at, sync_state
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                code = excluded.code,
                category = excluded.category,
                brand = excluded.brand,
                cost_cents = excluded.cost_cents,
                suggested_price_cents = excluded.suggested_price_cents,
                stock_quantity = excluded.stock_quantity,
                min_stock_threshold = excluded.min_stock_threshold,
                description = excluded.description,
                supplier = excluded.supplier,
                location = excluded.location,
                updated_at = excluded.updated_at,
                sync_state = excluded.sync_state
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(product.category.as_str())
        .bind(&product.brand)
        .bind(product.cost.cents())
        .bind(product.suggested_price.cents())
        .bind(product.stock_quantity)
        .bind(product.min_stock_threshold)
        .bind(&product.description)
        .bind(&product.supplier)
        .bind(&product.location)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.sync_state.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a product. Returns `false` when the id was not found.
    pub async fn remove(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks a product's local revision as acknowledged by the remote store.
    pub async fn mark_synced(&self, id: &str) -> StoreResult<()> {
        sqlx::query("UPDATE products SET sync_state = 'synced' WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Adjusts a product's stock by `delta` and records the movement in the
    /// same transaction.
    ///
    /// The arithmetic runs inside the database and the new balance comes
    /// back via `RETURNING`, so concurrent adjustments to the same product
    /// serialize and each movement records the balance it actually produced.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        kind: MovementKind,
        reason: Option<&str>,
    ) -> StoreResult<StockMovement> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

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
        .fetch_optional(&mut *tx)
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
            reason: reason.map(str::to_string),
            timestamp: now,
        };

        insert_movement(&mut *tx, &movement).await?;
        tx.commit().await?;

        Ok(movement)
    }
}

/// Decodes a product row.
pub(crate) fn product_from_row(row: &SqliteRow) -> StoreResult<Product> {
    let category: String = row.try_get("category")?;
    let sync_state: String = row.try_get("sync_state")?;

    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        category: Category::from_input(&category),
        brand: row.try_get("brand")?,
        cost: Money::from_cents(row.try_get("cost_cents")?),
        suggested_price: Money::from_cents(row.try_get("suggested_price_cents")?),
        stock_quantity: row.try_get("stock_quantity")?,
        min_stock_threshold: row.try_get("min_stock_threshold")?,
        description: row.try_get("description")?,
        supplier: row.try_get("supplier")?,
        location: row.try_get("location")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        sync_state: sync_state.parse::<SyncState>().map_err(StoreError::decode)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
