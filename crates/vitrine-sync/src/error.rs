//! # Sync Error Types
//!
//! Errors for the sync layer.
//!
//! ## Two Kinds of Failure
//! ```text
//! Fatal to the caller          Recovered by the engine
//! ─────────────────────        ─────────────────────────
//! Core / Validation            Gateway::Network   (Offline transition + enqueue)
//! Store (local persistence)    Gateway::Remote    (enqueue for retry)
//! Settings                     Gateway::Parse     (treated like Remote)
//! ```
//! A user-visible operation only ever fails on the left column; the right
//! column degrades to queued work and shows up in the sync status.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync layer error type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Domain rule or validation failure.
    #[error(transparent)]
    Core(#[from] vitrine_core::CoreError),

    /// Local persistence failure. Fatal: the operation did not happen.
    #[error("Local store error: {0}")]
    Store(#[from] vitrine_store::StoreError),

    /// Remote gateway failure. Only surfaces from explicit sync entry
    /// points (`sync_now`, `load_from_cloud`); optimistic pushes absorb it.
    #[error("Remote gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Payload (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sync settings are unusable.
    #[error("Invalid sync settings: {0}")]
    InvalidSettings(String),

    /// The remote endpoint URL is unusable.
    #[error("Invalid remote endpoint: {0}")]
    InvalidEndpoint(String),

    /// Failed to load the settings file.
    #[error("Failed to load settings: {0}")]
    SettingsLoad(String),

    /// Failed to save the settings file.
    #[error("Failed to save settings: {0}")]
    SettingsSave(String),
}

impl From<vitrine_core::ValidationError> for SyncError {
    fn from(err: vitrine_core::ValidationError) -> Self {
        SyncError::Core(err.into())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::SettingsLoad(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::SettingsLoad(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::SettingsSave(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidEndpoint(err.to_string())
    }
}

impl SyncError {
    /// True when the failure came from the remote side and the engine has
    /// already queued the work for retry.
    pub fn is_remote(&self) -> bool {
        matches!(self, SyncError::Gateway(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_wraps_through_core() {
        let err: SyncError = vitrine_core::ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, SyncError::Core(_)));
        assert!(!err.is_remote());
    }

    #[test]
    fn test_gateway_is_remote() {
        let err: SyncError = GatewayError::Network("offline".to_string()).into();
        assert!(err.is_remote());
    }
}
