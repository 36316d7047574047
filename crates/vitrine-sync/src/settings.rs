//! # Sync Settings
//!
//! Settings for the sync layer: the remote endpoint and the engine's
//! timing knobs. Loaded from an explicit TOML file path and passed in;
//! nothing reads ambient configuration.
//!
//! ```toml
//! endpoint = "https://script.example.com/macros/s/abc/exec"
//! request_timeout_secs = 10
//! poll_interval_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::error::{SyncError, SyncResult};

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    30
}

/// Sync layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Remote store endpoint URL.
    pub endpoint: String,

    /// Remote-call bound in seconds. A call that does not resolve within
    /// it counts as a network failure.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Period of the background drain timer in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl SyncSettings {
    /// Settings for the given endpoint with default timings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        SyncSettings {
            endpoint: endpoint.into(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }

    /// Loads and validates settings from a TOML file.
    pub fn load(path: &Path) -> SyncResult<SyncSettings> {
        info!(path = %path.display(), "Loading sync settings");

        let text = std::fs::read_to_string(path)?;
        let settings: SyncSettings = toml::from_str(&text)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Saves settings to a TOML file.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| SyncError::SettingsSave(e.to_string()))?;
        Ok(())
    }

    /// Validates the settings.
    pub fn validate(&self) -> SyncResult<()> {
        let url = Url::parse(&self.endpoint)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidEndpoint(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(SyncError::InvalidSettings(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(SyncError::InvalidSettings(
                "poll_interval_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Remote-call bound as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Drain timer period as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_on_parse() {
        let settings: SyncSettings =
            toml::from_str(r#"endpoint = "https://example.com/exec""#).unwrap();
        assert_eq!(settings.request_timeout_secs, 10);
        assert_eq!(settings.poll_interval_secs, 30);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let settings = SyncSettings::new("not a url");
        assert!(matches!(
            settings.validate().unwrap_err(),
            SyncError::InvalidEndpoint(_)
        ));

        let settings = SyncSettings::new("file:///etc/passwd");
        assert!(matches!(
            settings.validate().unwrap_err(),
            SyncError::InvalidEndpoint(_)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timings() {
        let mut settings = SyncSettings::new("https://example.com/exec");
        settings.request_timeout_secs = 0;
        assert!(matches!(
            settings.validate().unwrap_err(),
            SyncError::InvalidSettings(_)
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("vitrine-sync-settings-{}.toml", std::process::id()));

        let settings = SyncSettings {
            endpoint: "https://example.com/exec".to_string(),
            request_timeout_secs: 7,
            poll_interval_secs: 60,
        };
        settings.save(&path).unwrap();

        let loaded = SyncSettings::load(&path).unwrap();
        assert_eq!(loaded.endpoint, settings.endpoint);
        assert_eq!(loaded.request_timeout_secs, 7);
        assert_eq!(loaded.poll_interval_secs, 60);

        let _ = std::fs::remove_file(&path);
    }
}
