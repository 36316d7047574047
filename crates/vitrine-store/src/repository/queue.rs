//! # Pending Operation Queue
//!
//! The durable log of mutations not yet confirmed by the remote store.
//!
//! ## Ordering Guarantee
//! `seq` is an AUTOINCREMENT primary key, so enqueue order is total and
//! survives restarts. Replay is FIFO per collection: an Update enqueued
//! after an Add for the same record can never be replayed first.
//!
//! An entry leaves the queue only through `dequeue` after a confirmed
//! remote acknowledgment. Failures increment `attempt_count` and keep the
//! entry. Nothing here drops work silently.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use vitrine_core::{Collection, OperationKind, PendingOperation};

/// Repository for the pending-operation queue.
#[derive(Debug, Clone)]
pub struct QueueRepository {
    pool: SqlitePool,
}

impl QueueRepository {
    /// Creates a new QueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QueueRepository { pool }
    }

    /// Appends an operation to the queue.
    ///
    /// `attempt_count` starts at 0 for operations that never reached the
    /// remote store (enqueued while offline) and at 1 when an optimistic
    /// push already failed once.
    pub async fn enqueue(
        &self,
        collection: Collection,
        kind: OperationKind,
        payload: &serde_json::Value,
        attempt_count: i64,
        last_error: Option<&str>,
    ) -> StoreResult<PendingOperation> {
        let record_id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let enqueued_at = Utc::now();

        debug!(
            collection = collection.as_str(),
            kind = kind.as_str(),
            record_id = %record_id,
            "Enqueuing pending operation"
        );

        let row = sqlx::query(
            r#"
            INSERT INTO pending_queue (
                collection, kind, record_id, payload, enqueued_at, attempt_count, last_error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING seq
            "#,
        )
        .bind(collection.as_str())
        .bind(kind.as_str())
        .bind(&record_id)
        .bind(serde_json::to_string(payload)?)
        .bind(enqueued_at)
        .bind(attempt_count)
        .bind(last_error)
        .fetch_one(&self.pool)
        .await?;

        Ok(PendingOperation {
            seq: row.try_get("seq")?,
            collection,
            kind,
            payload: payload.clone(),
            enqueued_at,
            attempt_count,
            last_error: last_error.map(str::to_string),
        })
    }

    /// All pending operations in enqueue order.
    pub async fn peek_all(&self) -> StoreResult<Vec<PendingOperation>> {
        let rows = sqlx::query("SELECT * FROM pending_queue ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(operation_from_row).collect()
    }

    /// Removes a confirmed operation. Returns `false` when it was already
    /// gone.
    pub async fn dequeue(&self, seq: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM pending_queue WHERE seq = ?1")
            .bind(seq)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a failed replay attempt.
    pub async fn record_attempt(&self, seq: i64, error: &str) -> StoreResult<()> {
        sqlx::query(
            "UPDATE pending_queue SET attempt_count = attempt_count + 1, last_error = ?2 WHERE seq = ?1",
        )
        .bind(seq)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of pending operations.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_queue")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Record ids of a collection with at least one outstanding operation.
    ///
    /// Reconciliation pulls skip these: a local pending change always wins
    /// over a pulled remote snapshot.
    pub async fn pending_record_ids(&self, collection: Collection) -> StoreResult<HashSet<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT record_id FROM pending_queue WHERE collection = ?1 AND record_id != ''",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("record_id").map_err(StoreError::from))
            .collect()
    }
}

fn operation_from_row(row: &SqliteRow) -> StoreResult<PendingOperation> {
    let collection: String = row.try_get("collection")?;
    let kind: String = row.try_get("kind")?;
    let payload: String = row.try_get("payload")?;

    Ok(PendingOperation {
        seq: row.try_get("seq")?,
        collection: collection.parse::<Collection>().map_err(StoreError::decode)?,
        kind: kind.parse::<OperationKind>().map_err(StoreError::decode)?,
        payload: serde_json::from_str(&payload)?,
        enqueued_at: row.try_get::<DateTime<Utc>, _>("enqueued_at")?,
        attempt_count: row.try_get("attempt_count")?,
        last_error: row.try_get("last_error")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_fifo_order_per_enqueue() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let queue = store.queue();

        queue
            .enqueue(Collection::Products, OperationKind::Add, &json!({"id": "p1"}), 0, None)
            .await
            .unwrap();
        queue
            .enqueue(Collection::Sales, OperationKind::Add, &json!({"id": "s1"}), 0, None)
            .await
            .unwrap();
        queue
            .enqueue(Collection::Products, OperationKind::Update, &json!({"id": "p1"}), 0, None)
            .await
            .unwrap();

        let ops = queue.peek_all().await.unwrap();
        assert_eq!(ops.len(), 3);
        assert!(ops[0].seq < ops[1].seq && ops[1].seq < ops[2].seq);
        assert_eq!(ops[0].kind, OperationKind::Add);
        assert_eq!(ops[2].kind, OperationKind::Update);
    }

    #[tokio::test]
    async fn test_dequeue_only_removes_target() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let queue = store.queue();

        let a = queue
            .enqueue(Collection::Products, OperationKind::Add, &json!({"id": "p1"}), 0, None)
            .await
            .unwrap();
        queue
            .enqueue(Collection::Products, OperationKind::Update, &json!({"id": "p1"}), 0, None)
            .await
            .unwrap();

        assert!(queue.dequeue(a.seq).await.unwrap());
        assert!(!queue.dequeue(a.seq).await.unwrap());
        assert_eq!(queue.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_attempt_increments() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let queue = store.queue();

        let op = queue
            .enqueue(Collection::Sales, OperationKind::Add, &json!({"id": "s1"}), 1, None)
            .await
            .unwrap();
        assert_eq!(op.attempt_count, 1);

        queue.record_attempt(op.seq, "quota exceeded").await.unwrap();

        let ops = queue.peek_all().await.unwrap();
        assert_eq!(ops[0].attempt_count, 2);
        assert_eq!(ops[0].last_error.as_deref(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn test_pending_record_ids_by_collection() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let queue = store.queue();

        queue
            .enqueue(Collection::Products, OperationKind::Update, &json!({"id": "p1"}), 0, None)
            .await
            .unwrap();
        queue
            .enqueue(Collection::Sales, OperationKind::Add, &json!({"id": "s1"}), 0, None)
            .await
            .unwrap();

        let products = queue.pending_record_ids(Collection::Products).await.unwrap();
        assert!(products.contains("p1"));
        assert!(!products.contains("s1"));
    }

    #[tokio::test]
    async fn test_queue_survives_reopen() {
        // The queue must outlive a process restart. An on-disk store stands
        // in for one here; :memory: would vanish with the pool.
        let dir = std::env::temp_dir().join(format!("vitrine-queue-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("queue-reopen.db");
        let _ = std::fs::remove_file(&path);

        {
            let store = LocalStore::open(crate::pool::StoreConfig::new(&path)).await.unwrap();
            store
                .queue()
                .enqueue(Collection::Products, OperationKind::Add, &json!({"id": "p1"}), 0, None)
                .await
                .unwrap();
            store.close().await;
        }

        let store = LocalStore::open(crate::pool::StoreConfig::new(&path)).await.unwrap();
        let ops = store.queue().peek_all().await.unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].record_id(), Some("p1"));

        store.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
