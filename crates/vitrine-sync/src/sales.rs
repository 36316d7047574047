//! # Sale Repository (domain façade)
//!
//! The typed surface UI collaborators use for sales. Resolves drafts into
//! frozen sale snapshots, computes omitted totals, and hands the write to
//! the sync engine, which pairs a completed sale with its stock decrements
//! atomically.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use vitrine_core::{
    validation, CoreError, Money, PaymentMethod, Rate, Sale, SaleItem, SaleStatus, SyncState,
    ValidationError,
};
use vitrine_store::SaleFilter;

/// One line of a sale draft.
#[derive(Debug, Clone)]
pub struct SaleItemDraft {
    pub product_id: String,

    /// Unit price to charge; the product's current suggested price when
    /// omitted. Either way the price is frozen into the sale.
    pub unit_price: Option<Money>,

    pub quantity: i64,
}

/// A new sale as entered at the counter.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub items: Vec<SaleItemDraft>,

    /// Computed from the items when omitted.
    pub subtotal: Option<Money>,

    pub discount_amount: Option<Money>,
    pub discount_percent: Option<Rate>,
    pub fees: Option<Money>,

    /// `subtotal - discount + fees` when omitted.
    pub total_amount: Option<Money>,

    pub payment_method: PaymentMethod,

    /// `Completed` when omitted.
    pub status: Option<SaleStatus>,
}

/// Typed sale operations over the sync engine.
#[derive(Clone)]
pub struct Sales {
    engine: SyncEngine,
}

impl Sales {
    /// Creates the façade over a running engine.
    pub fn new(engine: &SyncEngine) -> Self {
        Sales {
            engine: engine.clone(),
        }
    }

    /// Records a sale. For a `Completed` sale the referenced products'
    /// stock is decremented in the same local transaction; the caller gets
    /// the durable local result and never waits on the remote.
    pub async fn add(&self, draft: SaleDraft) -> SyncResult<Sale> {
        if draft.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }

        // Resolve drafts into frozen line items before anything is written.
        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            validation::validate_quantity(line.quantity)?;

            let product = self
                .engine
                .store()
                .products()
                .get(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let unit_price = line.unit_price.unwrap_or(product.suggested_price);
            validation::validate_non_negative("unit_price", unit_price)?;

            items.push(SaleItem::new(
                product.id.clone(),
                product.name.clone(),
                unit_price,
                line.quantity,
            ));
        }

        let subtotal = draft
            .subtotal
            .unwrap_or_else(|| items.iter().map(|i| i.subtotal).sum());
        let discount_amount = draft.discount_amount.unwrap_or_default();
        let fees = draft.fees.unwrap_or_default();
        let total_amount = draft
            .total_amount
            .unwrap_or(subtotal - discount_amount + fees);

        validation::validate_non_negative("subtotal", subtotal)?;
        validation::validate_non_negative("discount_amount", discount_amount)?;
        validation::validate_non_negative("fees", fees)?;
        validation::validate_non_negative("total_amount", total_amount)?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            items,
            subtotal,
            discount_amount,
            discount_percent: draft.discount_percent.unwrap_or_default(),
            fees,
            total_amount,
            payment_method: draft.payment_method,
            status: draft.status.unwrap_or_default(),
            timestamp: now,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        };

        debug!(id = %sale.id, total = %sale.total_amount, items = sale.items.len(), "Recording sale");

        self.engine.apply_sale(&sale).await?;
        Ok(sale)
    }

    /// Cancels a completed sale, restoring the sold quantities.
    pub async fn cancel(&self, id: &str) -> SyncResult<Sale> {
        self.engine.cancel_sale(id).await
    }

    /// Gets one sale.
    pub async fn get(&self, id: &str) -> SyncResult<Option<Sale>> {
        Ok(self.engine.store().sales().get(id).await?)
    }

    /// Lists sales matching the filter.
    pub async fn list(&self, filter: &SaleFilter) -> SyncResult<Vec<Sale>> {
        Ok(self.engine.store().sales().list(filter).await?)
    }
}
