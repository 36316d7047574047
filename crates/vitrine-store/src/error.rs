//! # Store Error Types
//!
//! Errors from local persistence. These are the fatal half of the error
//! taxonomy: a failed local write aborts the operation and surfaces to the
//! caller, unlike remote failures which degrade to queued work.

use thiserror::Error;

/// Local persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Entity is in a state that does not allow the requested mutation,
    /// e.g. cancelling a sale that is not completed.
    #[error("{entity} {id} is {state}")]
    InvalidState {
        entity: String,
        id: String,
        state: String,
    },

    /// Database file unavailable, permissions issue, disk full.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Stored row could not be decoded into a domain record.
    #[error("Corrupt row: {0}")]
    Decode(String),

    /// JSON (de)serialization of a payload column failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        StoreError::Decode(msg.into())
    }
}

/// Convert sqlx errors to StoreError.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Decode(format!("column {index}: {source}"))
            }
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            other => StoreError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
