//! # Domain Types
//!
//! Core domain types for Vitrine.
//!
//! ## Record Envelope
//! Every domain record carries the same envelope:
//! - `id`: UUID v4, assigned locally at creation time (never by the remote
//!   store, so creation works offline). Immutable afterwards. The remote
//!   store upserts by this id, which makes queue replay idempotent.
//! - `created_at` / `updated_at`: set locally; `updated_at` refreshed on
//!   every mutation.
//! - `sync_state`: whether the remote copy is known to match the local one.
//!
//! ## Snapshot Pattern
//! A sale's items freeze the product name and unit price at sale time. A
//! sale is a historical document, not a live reference to current prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate in basis points (1 bp = 0.01%).
///
/// 350 bps = 3.5% (the default card fee). Integer basis points keep rate
/// arithmetic exact; conversion to a percentage happens only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage.
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Sync State
// =============================================================================

/// Whether the remote store's copy of a record is known to match ours.
///
/// `Pending` means the remote copy is unknown or stale relative to the local
/// copy. Only the sync engine transitions this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Local copy is ahead of (or unknown to) the remote store.
    Pending,
    /// Remote store has acknowledged this exact revision.
    Synced,
}

impl SyncState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
        }
    }
}

impl std::str::FromStr for SyncState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncState::Pending),
            "synced" => Ok(SyncState::Synced),
            other => Err(format!("unknown sync state: {other}")),
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Pending
    }
}

// =============================================================================
// Category
// =============================================================================

/// Product category, a fixed small set for a cosmetics shop.
///
/// Unknown input falls back to [`Category::Outros`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Maquiagem,
    Skincare,
    Acessorios,
    Fragrancias,
    Cabelos,
    #[serde(other)]
    Outros,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Maquiagem => "maquiagem",
            Category::Skincare => "skincare",
            Category::Acessorios => "acessorios",
            Category::Fragrancias => "fragrancias",
            Category::Cabelos => "cabelos",
            Category::Outros => "outros",
        }
    }

    /// Two-letter code used in derived product codes.
    pub const fn code(&self) -> &'static str {
        match self {
            Category::Maquiagem => "MQ",
            Category::Skincare => "SK",
            Category::Acessorios => "AC",
            Category::Fragrancias => "FR",
            Category::Cabelos => "CB",
            Category::Outros => "OT",
        }
    }

    /// Parses free-form input, falling back to `Outros`.
    pub fn from_input(s: &str) -> Category {
        match s.trim().to_lowercase().as_str() {
            "maquiagem" => Category::Maquiagem,
            "skincare" => Category::Skincare,
            "acessorios" => Category::Acessorios,
            "fragrancias" => Category::Fragrancias,
            "cabelos" => Category::Cabelos,
            _ => Category::Outros,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Outros
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4), assigned locally at creation.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Business code, derived at creation when the draft omits one
    /// (see [`crate::code::derive_product_code`]).
    pub code: String,

    /// Category, `Outros` when unknown.
    pub category: Category,

    /// Brand name.
    pub brand: Option<String>,

    /// Acquisition cost.
    pub cost: Money,

    /// Suggested sale price.
    pub suggested_price: Money,

    /// Current stock level.
    ///
    /// May go negative transiently while concurrent sale decrements settle;
    /// all mutation goes through the sync engine's update path.
    pub stock_quantity: i64,

    /// Stock level at or below which the product counts as low-stock.
    pub min_stock_threshold: i64,

    pub description: Option<String>,
    pub supplier: Option<String>,

    /// Physical storage location.
    pub location: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_state: SyncState,
}

impl Product {
    /// Low on stock: at or below the threshold but not out.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity > 0 && self.stock_quantity <= self.min_stock_threshold
    }
}

/// Default minimum-stock threshold for new products.
pub const DEFAULT_MIN_STOCK: i64 = 5;

// =============================================================================
// Sale Status / Payment Method
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Paid and finalized; stock has been decremented.
    Completed,
    /// Cancelled after completion; stock has been restored.
    Cancelled,
    /// Recorded but not finalized; no stock effect yet.
    Pending,
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Pending => "pending",
        }
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            "pending" => Ok(SaleStatus::Pending),
            other => Err(format!("unknown sale status: {other}")),
        }
    }
}

/// A sale defaults to `Completed`: the shop rings up and hands over.
impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Pix => "pix",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "pix" => Ok(PaymentMethod::Pix),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line item in a sale, frozen at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Unit price at time of sale (frozen).
    pub unit_price: Money,

    /// Quantity sold. Always positive.
    pub quantity: i64,

    /// `unit_price × quantity`, fixed at sale time.
    pub subtotal: Money,
}

impl SaleItem {
    /// Builds a line item, computing the subtotal.
    pub fn new(product_id: impl Into<String>, product_name: impl Into<String>, unit_price: Money, quantity: i64) -> Self {
        SaleItem {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
            subtotal: unit_price.saturating_mul(quantity),
        }
    }
}

/// A sale transaction. Immutable once recorded, except for cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,

    /// Ordered line items.
    pub items: Vec<SaleItem>,

    /// Sum of item subtotals.
    pub subtotal: Money,

    pub discount_amount: Money,

    /// Discount rate actually applied, informational.
    pub discount_percent: Rate,

    /// Payment fees added on top (card fee, for instance).
    pub fees: Money,

    /// `subtotal - discount_amount + fees`.
    pub total_amount: Money,

    pub payment_method: PaymentMethod,
    pub status: SaleStatus,

    /// The sale instant.
    pub timestamp: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sync_state: SyncState,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock added (purchase receipt, sale cancellation).
    Entry,
    /// Stock removed (sale, loss).
    Exit,
    /// Manual correction to an absolute or relative level.
    Adjustment,
}

impl MovementKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
            MovementKind::Adjustment => "adjustment",
        }
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(MovementKind::Entry),
            "exit" => Ok(MovementKind::Exit),
            "adjustment" => Ok(MovementKind::Adjustment),
            other => Err(format!("unknown movement kind: {other}")),
        }
    }
}

/// One entry in the append-only stock audit trail.
///
/// Written in the same transaction as the stock mutation it records, so the
/// trail and the stock level can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,

    /// Product name at movement time (frozen, like sale items).
    pub product_name: String,

    pub kind: MovementKind,

    /// Magnitude of the movement. Always positive; direction is `kind`.
    pub quantity: i64,

    pub balance_before: i64,
    pub balance_after: i64,

    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Pending Operations
// =============================================================================

/// Which remote collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Sales,
}

impl Collection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Sales => "sales",
        }
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" => Ok(Collection::Products),
            "sales" => Ok(Collection::Sales),
            other => Err(format!("unknown collection: {other}")),
        }
    }
}

/// What kind of mutation a pending operation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Add,
    Update,
    Delete,
}

impl OperationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(OperationKind::Add),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            other => Err(format!("unknown operation kind: {other}")),
        }
    }
}

/// A mutation that could not yet be confirmed against the remote store.
///
/// ## Lifecycle
/// Created when a write cannot be confirmed remotely; consumed only after a
/// confirmed remote acknowledgment; retried with an incremented
/// `attempt_count` on failure. Never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Queue sequence number. Enqueue order is replay order per collection.
    pub seq: i64,

    pub collection: Collection,
    pub kind: OperationKind,

    /// Full record for Add/Update; `{"id": …}` for Delete.
    pub payload: serde_json::Value,

    pub enqueued_at: DateTime<Utc>,

    /// Number of remote attempts made for this operation so far.
    pub attempt_count: i64,

    /// Message from the most recent failed attempt.
    pub last_error: Option<String>,
}

impl PendingOperation {
    /// The id of the record this operation targets, when the payload has one.
    pub fn record_id(&self) -> Option<&str> {
        self.payload.get("id").and_then(|v| v.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
