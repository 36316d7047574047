//! # Product Repository (domain façade)
//!
//! The typed surface UI collaborators use for products. Validates drafts,
//! assigns identity and derived codes, and hands every write to the sync
//! engine. Reads come straight from the local store.
//!
//! Failure semantics: a failed local write is fatal and surfaces here; a
//! failed remote write never is. It degrades to a queued operation.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use vitrine_core::{
    code::derive_product_code, validation, Category, CoreError, Money, MovementKind,
    OperationKind, Product, StockMovement, SyncState,
};
use vitrine_store::ProductFilter;

/// A new product as entered by the user. Everything optional gets a
/// documented default.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,

    /// Business code; derived from name, category, and creation instant
    /// when omitted.
    pub code: Option<String>,

    /// Category; `Outros` when omitted.
    pub category: Option<Category>,

    pub brand: Option<String>,

    /// Acquisition cost. Defaults to zero.
    pub cost: Option<Money>,

    /// Suggested sale price. Defaults to zero.
    pub suggested_price: Option<Money>,

    /// Opening stock. Defaults to zero.
    pub stock_quantity: Option<i64>,

    /// Low-stock threshold. Defaults to the shop-wide configured value.
    pub min_stock_threshold: Option<i64>,

    pub description: Option<String>,
    pub supplier: Option<String>,
    pub location: Option<String>,
}

/// A partial product update. `Some` fields replace, `None` fields keep.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<Category>,
    pub brand: Option<String>,
    pub cost: Option<Money>,
    pub suggested_price: Option<Money>,
    pub stock_quantity: Option<i64>,
    pub min_stock_threshold: Option<i64>,
    pub description: Option<String>,
    pub supplier: Option<String>,
    pub location: Option<String>,
}

/// Typed product operations over the sync engine.
#[derive(Clone)]
pub struct Products {
    engine: SyncEngine,
}

impl Products {
    /// Creates the façade over a running engine.
    pub fn new(engine: &SyncEngine) -> Self {
        Products {
            engine: engine.clone(),
        }
    }

    /// Adds a product. The returned product is already durable locally;
    /// remote confirmation happens in the background.
    pub async fn add(&self, draft: ProductDraft) -> SyncResult<Product> {
        validation::validate_product_name(&draft.name)?;

        let cost = draft.cost.unwrap_or_default();
        let suggested_price = draft.suggested_price.unwrap_or_default();
        validation::validate_non_negative("cost", cost)?;
        validation::validate_non_negative("suggested_price", suggested_price)?;

        let now = Utc::now();

        let code = match draft.code {
            Some(code) => {
                validation::validate_product_code(&code)?;
                code.trim().to_string()
            }
            None => derive_product_code(&draft.name, draft.category, now),
        };

        // The shop-wide threshold is the default for new products.
        let min_stock_threshold = match draft.min_stock_threshold {
            Some(threshold) => threshold,
            None => {
                self.engine
                    .store()
                    .settings()
                    .load()
                    .await?
                    .min_stock_threshold
            }
        };

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            code,
            category: draft.category.unwrap_or_default(),
            brand: draft.brand,
            cost,
            suggested_price,
            stock_quantity: draft.stock_quantity.unwrap_or(0),
            min_stock_threshold,
            description: draft.description,
            supplier: draft.supplier,
            location: draft.location,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        };

        debug!(id = %product.id, code = %product.code, "Adding product");

        self.engine.apply_product(&product, OperationKind::Add).await?;
        Ok(product)
    }

    /// Applies a patch to an existing product.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> SyncResult<Product> {
        let mut product = self
            .engine
            .store()
            .products()
            .get(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            validation::validate_product_name(&name)?;
            product.name = name.trim().to_string();
        }
        if let Some(code) = patch.code {
            validation::validate_product_code(&code)?;
            product.code = code.trim().to_string();
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(brand) = patch.brand {
            product.brand = Some(brand);
        }
        if let Some(cost) = patch.cost {
            validation::validate_non_negative("cost", cost)?;
            product.cost = cost;
        }
        if let Some(price) = patch.suggested_price {
            validation::validate_non_negative("suggested_price", price)?;
            product.suggested_price = price;
        }
        if let Some(stock) = patch.stock_quantity {
            product.stock_quantity = stock;
        }
        if let Some(threshold) = patch.min_stock_threshold {
            product.min_stock_threshold = threshold;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(supplier) = patch.supplier {
            product.supplier = Some(supplier);
        }
        if let Some(location) = patch.location {
            product.location = Some(location);
        }

        product.updated_at = Utc::now();
        product.sync_state = SyncState::Pending;

        self.engine
            .apply_product(&product, OperationKind::Update)
            .await?;
        Ok(product)
    }

    /// Deletes a product. Returns `false` when the id was not found.
    pub async fn delete(&self, id: &str) -> SyncResult<bool> {
        self.engine.delete_product(id).await
    }

    /// Gets one product.
    pub async fn get(&self, id: &str) -> SyncResult<Option<Product>> {
        Ok(self.engine.store().products().get(id).await?)
    }

    /// Lists products matching the filter.
    pub async fn list(&self, filter: &ProductFilter) -> SyncResult<Vec<Product>> {
        Ok(self.engine.store().products().list(filter).await?)
    }

    /// Manual stock adjustment (correction, received shipment, loss).
    /// Positive `delta` adds stock, negative removes it.
    pub async fn adjust_stock(
        &self,
        id: &str,
        delta: i64,
        reason: Option<&str>,
    ) -> SyncResult<StockMovement> {
        self.engine
            .adjust_stock(id, delta, MovementKind::Adjustment, reason)
            .await
    }
}
