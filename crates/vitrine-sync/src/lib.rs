//! # vitrine-sync: Offline-First Sync Layer for Vitrine
//!
//! Orchestrates reads and writes across the local store, the remote
//! gateway, and the pending-operation queue.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     vitrine-sync (THIS CRATE)                   │
//! │                                                                 │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────────────────┐  │
//! │  │  Products /   │──►│  SyncEngine   │──►│  RemoteGateway   │  │
//! │  │  Sales        │   │  (engine.rs)  │   │  (gateway.rs)    │  │
//! │  │  (façades)    │   │               │   │                  │  │
//! │  │               │   │ state machine │   │ HTTP, stateless, │  │
//! │  │ drafts, codes │   │ pusher, drain │   │ no retries       │  │
//! │  └───────────────┘   └──────┬────────┘   └──────────────────┘  │
//! │                             │                                   │
//! └─────────────────────────────┼───────────────────────────────────┘
//!                               ▼
//!                    vitrine-store (local SQLite:
//!                    records, queue, movements, settings)
//! ```
//!
//! ## Guarantees
//! - Every domain write lands in the local store before the caller sees
//!   success; the remote round-trip never blocks or fails a user action.
//! - Queued operations replay FIFO per collection and are never dropped.
//! - Reconciliation pulls keep local pending changes (local wins until
//!   the remote confirms).
//!
//! ## Usage
//! ```rust,ignore
//! let store = LocalStore::open(StoreConfig::new("vitrine.db")).await?;
//! let settings = SyncSettings::load(Path::new("sync.toml"))?;
//! let gateway = Arc::new(HttpGateway::from_settings(&settings)?);
//! let engine = SyncEngine::start(store, gateway, EngineOptions::default()).await?;
//!
//! let products = Products::new(&engine);
//! let product = products.add(draft).await?;      // durable immediately
//! let status = engine.status().await;            // advisory sync status
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod gateway;
pub mod products;
pub mod sales;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{DrainSummary, EngineOptions, EngineState, PullSummary, SyncEngine, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use gateway::{Action, GatewayError, GatewayResult, HttpGateway, RemoteGateway};
pub use products::{ProductDraft, ProductPatch, Products};
pub use sales::{SaleDraft, SaleItemDraft, Sales};
pub use settings::SyncSettings;

// Filters live with the store but are part of this crate's surface.
pub use vitrine_store::{ProductFilter, SaleFilter};
