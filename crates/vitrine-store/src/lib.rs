//! # vitrine-store: Local Store for Vitrine
//!
//! On-device persistence for the offline-first core: the canonical local
//! copy of products and sales, the durable pending-operation queue, the
//! stock-movement audit trail, and the settings key space. SQLite via sqlx.
//!
//! ## Ownership
//! This crate owns the canonical on-device copy of every record. The remote
//! gateway never caches, and only the sync engine (in `vitrine-sync`)
//! mutates sync state or the pending queue. UI-facing collaborators read
//! and write exclusively through the engine's repositories.
//!
//! ## Module Organization
//!
//! - [`pool`] - Store handle, pool configuration
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Store error types
//! - [`repository`] - Per-collection repositories

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{LocalStore, StoreConfig};

pub use repository::movement::{MovementRepository, RECENT_WINDOW};
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::queue::QueueRepository;
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::settings::SettingsRepository;
