//! # Sync Engine
//!
//! The one component that orchestrates the local store, the remote gateway,
//! and the pending queue. It owns the connectivity state machine and is the
//! only writer of sync state and queue entries.
//!
//! ## State Machine
//! ```text
//!             connectivity up                 queue non-empty AND
//!            ┌───────────────►┐              (timer | explicit | just
//!            │                │               came online)
//!   ┌────────┴──┐       ┌─────▼──────┐      ┌───────────────┐
//!   │  Offline  │       │ OnlineIdle ├─────►│ OnlineSyncing │
//!   └────────▲──┘       └─────▲──────┘      └──────┬────────┘
//!            │                │    drain completes │
//!            │                └────────────────────┘
//!            │ any network failure / connectivity down
//!            └──────────────────────────────────────────────
//! ```
//!
//! ## Apply Path (every domain write)
//! 1. Write to the local store. That write's outcome IS the caller's
//!    outcome; the caller never blocks on, or observes, the remote.
//! 2. `Offline`: enqueue the operation and return.
//! 3. `Online-*`: hand the operation to the background pusher. One
//!    consumer drains the channel, so optimistic pushes keep submission
//!    order. Success marks the record synced; a network failure flips the
//!    engine offline and enqueues; a remote/parse failure enqueues for
//!    retry with the failed attempt counted. Remote failure is never
//!    data loss.
//!
//! ## Drain (queue replay)
//! FIFO per collection. A failed operation stalls its own collection for
//! the rest of the pass, so an Update can never be replayed before the Add
//! it follows; the other collection keeps going. A network failure ends
//! the pass and flips the engine offline.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::gateway::{Action, GatewayError, RemoteGateway};
use vitrine_core::{
    Collection, CoreError, MovementKind, OperationKind, Product, Sale, StockMovement, SyncState,
};
use vitrine_store::{LocalStore, StoreError};

// =============================================================================
// Engine State
// =============================================================================

/// Connectivity state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No usable transport. Writes are queued.
    Offline,
    /// Transport available, no drain in progress.
    OnlineIdle,
    /// A drain pass is replaying the queue.
    OnlineSyncing,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Offline => write!(f, "offline"),
            EngineState::OnlineIdle => write!(f, "online-idle"),
            EngineState::OnlineSyncing => write!(f, "online-syncing"),
        }
    }
}

// =============================================================================
// Status & Summaries
// =============================================================================

/// Advisory sync status for external display. Never blocks anything.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    /// Whether the engine believes it has a transport.
    pub online: bool,

    /// Exact engine state.
    pub state: EngineState,

    /// Number of operations waiting for remote confirmation.
    pub pending_count: i64,

    /// When the remote store last confirmed anything.
    pub last_sync_at: Option<DateTime<Utc>>,

    /// Most recent sync failure, if any.
    pub last_error: Option<String>,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default)]
pub struct DrainSummary {
    /// Operations attempted this pass.
    pub attempted: usize,
    /// Operations confirmed and dequeued.
    pub confirmed: usize,
    /// Operations that failed and stayed queued.
    pub failed: usize,
    /// Operations still queued after the pass.
    pub remaining: i64,
}

/// Outcome of one reconciliation pull.
#[derive(Debug, Clone, Default)]
pub struct PullSummary {
    /// Products replaced from the remote snapshot.
    pub products_pulled: usize,
    /// Sales replaced from the remote snapshot.
    pub sales_pulled: usize,
    /// Records skipped because a local pending operation outranks the
    /// pulled copy (local wins until confirmed).
    pub skipped_local_pending: usize,
}

/// Engine construction options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Period of the background drain timer.
    pub poll_interval: Duration,

    /// Run a full `sync_now` in the background right after startup when
    /// the connectivity probe succeeds.
    pub initial_sync: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            poll_interval: Duration::from_secs(30),
            initial_sync: true,
        }
    }
}

// =============================================================================
// Pusher Jobs
// =============================================================================

enum PushJob {
    Operation {
        collection: Collection,
        kind: OperationKind,
        payload: Value,
    },
    /// Acknowledged once every job submitted before it has finished.
    Flush(oneshot::Sender<()>),
}

// =============================================================================
// Engine Internals
// =============================================================================

struct EngineInner {
    store: LocalStore,
    gateway: Arc<dyn RemoteGateway>,
    state: RwLock<EngineState>,
    last_sync_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
    /// At most one drain pass at a time.
    drain_lock: Mutex<()>,
}

impl EngineInner {
    async fn set_state(&self, next: EngineState) {
        let mut state = self.state.write().await;
        if *state != next {
            info!(from = %*state, to = %next, "Sync state transition");
            *state = next;
        }
    }

    async fn go_offline(&self, reason: &str) {
        self.set_state(EngineState::Offline).await;
        *self.last_error.write().await = Some(reason.to_string());
    }

    async fn touch_last_sync(&self) {
        *self.last_sync_at.write().await = Some(Utc::now());
        *self.last_error.write().await = None;
    }

    /// Marks the targeted record's local copy as acknowledged.
    async fn mark_record_synced(&self, collection: Collection, kind: OperationKind, payload: &Value) {
        if kind == OperationKind::Delete {
            return;
        }

        let Some(id) = payload.get("id").and_then(|v| v.as_str()) else {
            return;
        };

        let result = match collection {
            Collection::Products => self.store.products().mark_synced(id).await,
            Collection::Sales => self.store.sales().mark_synced(id).await,
        };

        if let Err(e) = result {
            error!(?e, id = %id, "Failed to mark record synced");
        }
    }

    /// One optimistic push, taken off the pusher channel.
    async fn push_operation(&self, collection: Collection, kind: OperationKind, payload: Value) {
        // The engine may have gone offline since this job was submitted.
        if *self.state.read().await == EngineState::Offline {
            if let Err(e) = self
                .store
                .queue()
                .enqueue(collection, kind, &payload, 0, None)
                .await
            {
                error!(?e, "Failed to enqueue while offline");
            }
            return;
        }

        let action = action_for(collection, kind);
        match self.gateway.call(action, Some(&payload)).await {
            Ok(_) => {
                debug!(action = %action, "Optimistic push confirmed");
                self.mark_record_synced(collection, kind, &payload).await;
                self.touch_last_sync().await;
            }
            Err(GatewayError::Network(msg)) => {
                warn!(action = %action, error = %msg, "Push hit network failure, going offline");
                self.go_offline(&msg).await;
                if let Err(e) = self
                    .store
                    .queue()
                    .enqueue(collection, kind, &payload, 1, Some(&msg))
                    .await
                {
                    error!(?e, "Failed to enqueue after network failure");
                }
            }
            Err(err) => {
                // Remote or parse failure: the transport works, the remote
                // store did not accept. Queue for replay, count the attempt.
                let msg = err.to_string();
                warn!(action = %action, error = %msg, "Push rejected, queuing for retry");
                *self.last_error.write().await = Some(msg.clone());
                if let Err(e) = self
                    .store
                    .queue()
                    .enqueue(collection, kind, &payload, 1, Some(&msg))
                    .await
                {
                    error!(?e, "Failed to enqueue after remote failure");
                }
            }
        }
    }

    /// One drain pass over the queue snapshot, FIFO per collection.
    async fn drain(&self) -> SyncResult<DrainSummary> {
        let _guard = self.drain_lock.lock().await;

        if *self.state.read().await == EngineState::Offline {
            debug!("Skipping drain while offline");
            return Ok(DrainSummary::default());
        }

        let ops = self.store.queue().peek_all().await?;
        if ops.is_empty() {
            return Ok(DrainSummary {
                remaining: 0,
                ..DrainSummary::default()
            });
        }

        self.set_state(EngineState::OnlineSyncing).await;
        info!(count = ops.len(), "Draining pending queue");

        let mut summary = DrainSummary::default();
        let mut stalled: HashSet<Collection> = HashSet::new();

        for op in ops {
            // A failed operation stalls its collection: replaying a later
            // operation of the same collection would break FIFO order.
            if stalled.contains(&op.collection) {
                continue;
            }

            summary.attempted += 1;
            let action = action_for(op.collection, op.kind);

            match self.gateway.call(action, Some(&op.payload)).await {
                Ok(_) => {
                    self.store.queue().dequeue(op.seq).await?;
                    self.mark_record_synced(op.collection, op.kind, &op.payload).await;
                    summary.confirmed += 1;
                }
                Err(GatewayError::Network(msg)) => {
                    warn!(seq = op.seq, error = %msg, "Drain hit network failure, ending pass");
                    self.store.queue().record_attempt(op.seq, &msg).await?;
                    summary.failed += 1;
                    self.go_offline(&msg).await;
                    summary.remaining = self.store.queue().count().await?;
                    return Ok(summary);
                }
                Err(err) => {
                    let msg = err.to_string();
                    warn!(
                        seq = op.seq,
                        collection = op.collection.as_str(),
                        error = %msg,
                        "Replay rejected, stalling collection for this pass"
                    );
                    self.store.queue().record_attempt(op.seq, &msg).await?;
                    *self.last_error.write().await = Some(msg);
                    stalled.insert(op.collection);
                    summary.failed += 1;
                }
            }
        }

        self.set_state(EngineState::OnlineIdle).await;

        if summary.failed == 0 {
            self.touch_last_sync().await;
        }

        summary.remaining = self.store.queue().count().await?;
        info!(
            confirmed = summary.confirmed,
            failed = summary.failed,
            remaining = summary.remaining,
            "Drain pass complete"
        );

        Ok(summary)
    }

    /// Full reconciliation pull: replace local copies from the remote
    /// snapshot, except records with outstanding local operations.
    async fn pull(&self) -> SyncResult<PullSummary> {
        let mut summary = PullSummary::default();

        // Products
        let data = match self.gateway.call(Action::GetProducts, None).await {
            Ok(data) => data,
            Err(err) => return Err(self.absorb_pull_failure(err).await),
        };
        let remote_products: Vec<Product> = decode_collection(data)?;
        let pending = self
            .store
            .queue()
            .pending_record_ids(Collection::Products)
            .await?;

        for mut product in remote_products {
            if pending.contains(&product.id) {
                debug!(id = %product.id, "Keeping local copy over pulled product");
                summary.skipped_local_pending += 1;
                continue;
            }
            product.sync_state = SyncState::Synced;
            self.store.products().upsert(&product).await?;
            summary.products_pulled += 1;
        }

        // Sales
        let data = match self.gateway.call(Action::GetSales, None).await {
            Ok(data) => data,
            Err(err) => return Err(self.absorb_pull_failure(err).await),
        };
        let remote_sales: Vec<Sale> = decode_collection(data)?;
        let pending = self
            .store
            .queue()
            .pending_record_ids(Collection::Sales)
            .await?;

        for mut sale in remote_sales {
            if pending.contains(&sale.id) {
                debug!(id = %sale.id, "Keeping local copy over pulled sale");
                summary.skipped_local_pending += 1;
                continue;
            }
            sale.sync_state = SyncState::Synced;
            self.store.sales().upsert(&sale).await?;
            summary.sales_pulled += 1;
        }

        self.touch_last_sync().await;
        info!(
            products = summary.products_pulled,
            sales = summary.sales_pulled,
            skipped = summary.skipped_local_pending,
            "Reconciliation pull complete"
        );

        Ok(summary)
    }

    async fn absorb_pull_failure(&self, err: GatewayError) -> SyncError {
        if let GatewayError::Network(msg) = &err {
            self.go_offline(msg).await;
        } else {
            *self.last_error.write().await = Some(err.to_string());
        }
        err.into()
    }
}

/// Pulled collections arrive as JSON arrays of full records.
fn decode_collection<T: serde::de::DeserializeOwned>(data: Value) -> SyncResult<Vec<T>> {
    if data.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(data)
        .map_err(|e| SyncError::Gateway(GatewayError::Parse(e.to_string())))
}

/// Remote verb for a queued operation.
///
/// Sale updates travel as `addSale`: the remote store upserts by the
/// record's pre-assigned id, which is also what makes replay idempotent.
fn action_for(collection: Collection, kind: OperationKind) -> Action {
    match (collection, kind) {
        (Collection::Products, OperationKind::Add) => Action::AddProduct,
        (Collection::Products, OperationKind::Update) => Action::UpdateProduct,
        (Collection::Products, OperationKind::Delete) => Action::DeleteProduct,
        (Collection::Sales, _) => Action::AddSale,
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// Handle to the running sync engine. Cheap to clone; all clones share the
/// same state, pusher, and timer.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
    push_tx: mpsc::Sender<PushJob>,
    timer_shutdown_tx: mpsc::Sender<()>,
}

impl SyncEngine {
    /// Starts the engine: probes connectivity to pick the initial state,
    /// then spawns the pusher and the periodic drain timer.
    pub async fn start(
        store: LocalStore,
        gateway: Arc<dyn RemoteGateway>,
        options: EngineOptions,
    ) -> SyncResult<SyncEngine> {
        let initial_state = match gateway.call(Action::Probe, None).await {
            Ok(_) => EngineState::OnlineIdle,
            // A reachable remote that answers badly is still a transport.
            Err(GatewayError::Remote { .. }) | Err(GatewayError::Parse(_)) => {
                EngineState::OnlineIdle
            }
            Err(GatewayError::Network(msg)) => {
                info!(error = %msg, "Connectivity probe failed, starting offline");
                EngineState::Offline
            }
        };

        info!(state = %initial_state, "Starting sync engine");

        let inner = Arc::new(EngineInner {
            store,
            gateway,
            state: RwLock::new(initial_state),
            last_sync_at: RwLock::new(None),
            last_error: RwLock::new(None),
            drain_lock: Mutex::new(()),
        });

        let (push_tx, push_rx) = mpsc::channel(100);
        tokio::spawn(Self::pusher_loop(inner.clone(), push_rx));

        let (timer_shutdown_tx, timer_shutdown_rx) = mpsc::channel(1);
        tokio::spawn(Self::timer_loop(
            inner.clone(),
            options.poll_interval,
            timer_shutdown_rx,
        ));

        let engine = SyncEngine {
            inner,
            push_tx,
            timer_shutdown_tx,
        };

        if options.initial_sync && initial_state == EngineState::OnlineIdle {
            let background = engine.clone();
            tokio::spawn(async move {
                if let Err(e) = background.sync_now().await {
                    warn!(?e, "Initial sync failed");
                }
            });
        }

        Ok(engine)
    }

    /// The single consumer of optimistic pushes. One consumer means pushes
    /// keep submission order.
    async fn pusher_loop(inner: Arc<EngineInner>, mut rx: mpsc::Receiver<PushJob>) {
        debug!("Pusher starting");

        while let Some(job) = rx.recv().await {
            match job {
                PushJob::Operation {
                    collection,
                    kind,
                    payload,
                } => inner.push_operation(collection, kind, payload).await,
                PushJob::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        debug!("Pusher stopped");
    }

    /// Periodic drain trigger.
    async fn timer_loop(
        inner: Arc<EngineInner>,
        poll_interval: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if *inner.state.read().await != EngineState::OnlineIdle {
                        continue;
                    }
                    match inner.store.queue().count().await {
                        Ok(0) => {}
                        Ok(_) => {
                            if let Err(e) = inner.drain().await {
                                error!(?e, "Timed drain failed");
                            }
                        }
                        Err(e) => error!(?e, "Failed to read queue size"),
                    }
                }

                _ = shutdown_rx.recv() => {
                    debug!("Timer stopping");
                    break;
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Apply operations (used by the domain repositories)
    // -------------------------------------------------------------------------

    /// Applies a product add/update: local upsert, then the optimistic
    /// remote path. The local write's outcome is the caller's outcome.
    pub async fn apply_product(&self, product: &Product, kind: OperationKind) -> SyncResult<()> {
        self.inner.store.products().upsert(product).await?;
        self.dispatch(Collection::Products, kind, serde_json::to_value(product)?)
            .await
    }

    /// Deletes a product locally and queues/pushes the remote delete.
    /// Returns `false` when the id was not found (not an error).
    pub async fn delete_product(&self, id: &str) -> SyncResult<bool> {
        let removed = self.inner.store.products().remove(id).await?;
        if removed {
            self.dispatch(
                Collection::Products,
                OperationKind::Delete,
                serde_json::json!({ "id": id }),
            )
            .await?;
        }
        Ok(removed)
    }

    /// Records a sale with its stock pairing, then pushes the sale and the
    /// stock-bearing product updates so the remote copy converges.
    pub async fn apply_sale(&self, sale: &Sale) -> SyncResult<Vec<StockMovement>> {
        let movements = self.inner.store.sales().record(sale).await?;

        self.dispatch(Collection::Sales, OperationKind::Add, serde_json::to_value(sale)?)
            .await?;
        for movement in &movements {
            self.dispatch_product_update(&movement.product_id).await?;
        }

        Ok(movements)
    }

    /// Cancels a completed sale (restoring stock), then pushes the updated
    /// sale and products.
    pub async fn cancel_sale(&self, sale_id: &str) -> SyncResult<Sale> {
        let (sale, movements) = match self.inner.store.sales().cancel(sale_id).await {
            Ok(result) => result,
            Err(StoreError::InvalidState { id, state, .. }) => {
                return Err(CoreError::InvalidSaleStatus {
                    sale_id: id,
                    current_status: state,
                }
                .into());
            }
            Err(StoreError::NotFound { entity, id }) if entity == "Sale" => {
                return Err(CoreError::SaleNotFound(id).into());
            }
            Err(other) => return Err(other.into()),
        };

        self.dispatch(Collection::Sales, OperationKind::Update, serde_json::to_value(&sale)?)
            .await?;
        for movement in &movements {
            self.dispatch_product_update(&movement.product_id).await?;
        }

        Ok(sale)
    }

    /// Manual stock adjustment with its audit movement, then a product
    /// update push.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        kind: MovementKind,
        reason: Option<&str>,
    ) -> SyncResult<StockMovement> {
        let movement = match self
            .inner
            .store
            .products()
            .adjust_stock(product_id, delta, kind, reason)
            .await
        {
            Ok(movement) => movement,
            Err(StoreError::NotFound { id, .. }) => {
                return Err(CoreError::ProductNotFound(id).into());
            }
            Err(other) => return Err(other.into()),
        };

        self.dispatch_product_update(product_id).await?;
        Ok(movement)
    }

    /// Routes an already-persisted operation onto the remote path:
    /// queue when offline, background push when online.
    async fn dispatch(
        &self,
        collection: Collection,
        kind: OperationKind,
        payload: Value,
    ) -> SyncResult<()> {
        if *self.inner.state.read().await == EngineState::Offline {
            self.inner
                .store
                .queue()
                .enqueue(collection, kind, &payload, 0, None)
                .await?;
            return Ok(());
        }

        let job = PushJob::Operation {
            collection,
            kind,
            payload,
        };

        if let Err(mpsc::error::SendError(PushJob::Operation {
            collection,
            kind,
            payload,
        })) = self.push_tx.send(job).await
        {
            // Pusher gone (shutdown); fall back to the durable queue.
            self.inner
                .store
                .queue()
                .enqueue(collection, kind, &payload, 0, None)
                .await?;
        }

        Ok(())
    }

    /// Pushes the current local revision of a product as an update.
    async fn dispatch_product_update(&self, product_id: &str) -> SyncResult<()> {
        if let Some(product) = self.inner.store.products().get(product_id).await? {
            self.dispatch(
                Collection::Products,
                OperationKind::Update,
                serde_json::to_value(&product)?,
            )
            .await?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sync entry points
    // -------------------------------------------------------------------------

    /// Explicit sync request: drain the queue, then reconcile from the
    /// remote snapshot.
    pub async fn sync_now(&self) -> SyncResult<(DrainSummary, PullSummary)> {
        let drained = self.inner.drain().await?;

        if *self.inner.state.read().await == EngineState::Offline {
            return Ok((drained, PullSummary::default()));
        }

        let pulled = self.inner.pull().await?;
        Ok((drained, pulled))
    }

    /// One drain pass over the pending queue.
    pub async fn drain(&self) -> SyncResult<DrainSummary> {
        self.inner.drain().await
    }

    /// Full reconciliation pull. Local pending changes always survive it.
    pub async fn load_from_cloud(&self) -> SyncResult<PullSummary> {
        self.inner.pull().await
    }

    /// Connectivity notification from the platform.
    ///
    /// Coming online kicks a background drain; going offline queues all
    /// subsequent writes.
    pub async fn connectivity_changed(&self, online: bool) {
        if online {
            let was_offline = *self.inner.state.read().await == EngineState::Offline;
            if was_offline {
                self.inner.set_state(EngineState::OnlineIdle).await;
                let inner = self.inner.clone();
                tokio::spawn(async move {
                    if let Err(e) = inner.drain().await {
                        error!(?e, "Drain after reconnect failed");
                    }
                });
            }
        } else {
            self.inner.go_offline("connectivity lost").await;
        }
    }

    /// Current advisory sync status.
    pub async fn status(&self) -> SyncStatus {
        let state = *self.inner.state.read().await;
        let pending_count = self.inner.store.queue().count().await.unwrap_or(0);

        SyncStatus {
            online: state != EngineState::Offline,
            state,
            pending_count,
            last_sync_at: *self.inner.last_sync_at.read().await,
            last_error: self.inner.last_error.read().await.clone(),
        }
    }

    /// Waits until every optimistic push submitted so far has finished.
    /// Used on shutdown, and by tests that need the background path settled.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.push_tx.send(PushJob::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Graceful shutdown: settle in-flight pushes, stop the timer.
    pub async fn shutdown(&self) {
        info!("Shutting down sync engine");
        self.flush().await;
        let _ = self.timer_shutdown_tx.send(()).await;
    }

    /// Read access to the local store for listings.
    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vitrine_core::{Category, Money, DEFAULT_MIN_STOCK};

    struct OfflineGateway;

    #[async_trait]
    impl RemoteGateway for OfflineGateway {
        async fn call(&self, _action: Action, _payload: Option<&Value>) -> Result<Value, GatewayError> {
            Err(GatewayError::Network("unreachable".to_string()))
        }
    }

    struct OkGateway;

    #[async_trait]
    impl RemoteGateway for OkGateway {
        async fn call(&self, _action: Action, _payload: Option<&Value>) -> Result<Value, GatewayError> {
            Ok(Value::Null)
        }
    }

    fn quiet_options() -> EngineOptions {
        EngineOptions {
            poll_interval: Duration::from_secs(3600),
            initial_sync: false,
        }
    }

    fn sample_product(id: &str) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: "Batom Matte".to_string(),
            code: "MQ-BM-0001".to_string(),
            category: Category::Maquiagem,
            brand: None,
            cost: Money::from_cents(1050),
            suggested_price: Money::from_cents(2500),
            stock_quantity: 10,
            min_stock_threshold: DEFAULT_MIN_STOCK,
            description: None,
            supplier: None,
            location: None,
            created_at: now,
            updated_at: now,
            sync_state: SyncState::Pending,
        }
    }

    #[tokio::test]
    async fn test_probe_failure_starts_offline() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let engine = SyncEngine::start(store, Arc::new(OfflineGateway), quiet_options())
            .await
            .unwrap();

        let status = engine.status().await;
        assert!(!status.online);
        assert_eq!(status.state, EngineState::Offline);
        assert_eq!(status.pending_count, 0);
    }

    #[tokio::test]
    async fn test_probe_success_starts_online() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let engine = SyncEngine::start(store, Arc::new(OkGateway), quiet_options())
            .await
            .unwrap();

        assert_eq!(engine.status().await.state, EngineState::OnlineIdle);
    }

    #[tokio::test]
    async fn test_offline_apply_enqueues_without_attempt() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let engine = SyncEngine::start(store, Arc::new(OfflineGateway), quiet_options())
            .await
            .unwrap();

        engine
            .apply_product(&sample_product("p1"), OperationKind::Add)
            .await
            .unwrap();

        let ops = engine.store().queue().peek_all().await.unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Add);
        assert_eq!(ops[0].attempt_count, 0);
    }

    #[tokio::test]
    async fn test_connectivity_transitions() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let engine = SyncEngine::start(store, Arc::new(OkGateway), quiet_options())
            .await
            .unwrap();

        engine.connectivity_changed(false).await;
        assert_eq!(engine.status().await.state, EngineState::Offline);

        engine.connectivity_changed(true).await;
        assert_eq!(engine.status().await.state, EngineState::OnlineIdle);
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_false_and_queues_nothing() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let engine = SyncEngine::start(store, Arc::new(OfflineGateway), quiet_options())
            .await
            .unwrap();

        assert!(!engine.delete_product("missing").await.unwrap());
        assert_eq!(engine.store().queue().count().await.unwrap(), 0);
    }

    #[test]
    fn test_action_mapping() {
        assert_eq!(
            action_for(Collection::Products, OperationKind::Add),
            Action::AddProduct
        );
        assert_eq!(
            action_for(Collection::Products, OperationKind::Delete),
            Action::DeleteProduct
        );
        assert_eq!(action_for(Collection::Sales, OperationKind::Add), Action::AddSale);
        assert_eq!(
            action_for(Collection::Sales, OperationKind::Update),
            Action::AddSale
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(EngineState::Offline.to_string(), "offline");
        assert_eq!(EngineState::OnlineSyncing.to_string(), "online-syncing");
    }
}
