//! # Settings Repository
//!
//! The scalar configuration values, persisted as a key/value table and
//! exposed as one explicit [`Configuration`] object. Components receive the
//! loaded value; nobody reads settings keys ad hoc.

use sqlx::{Row, SqlitePool};

use crate::error::StoreResult;
use vitrine_core::{Configuration, Rate};

const KEY_CARD_FEE: &str = "card_fee_bps";
const KEY_TAX: &str = "tax_bps";
const KEY_TARGET_MARGIN: &str = "target_margin_bps";
const KEY_MIN_STOCK: &str = "min_stock_threshold";

/// Repository for shop settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the configuration. Missing or unparseable keys keep their
    /// documented defaults.
    pub async fn load(&self) -> StoreResult<Configuration> {
        let mut cfg = Configuration::default();

        let rows = sqlx::query("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let key: String = row.try_get("key")?;
            let value: String = row.try_get("value")?;

            match key.as_str() {
                KEY_CARD_FEE => {
                    if let Ok(bps) = value.parse() {
                        cfg.card_fee = Rate::from_bps(bps);
                    }
                }
                KEY_TAX => {
                    if let Ok(bps) = value.parse() {
                        cfg.tax = Rate::from_bps(bps);
                    }
                }
                KEY_TARGET_MARGIN => {
                    if let Ok(bps) = value.parse() {
                        cfg.target_margin = Rate::from_bps(bps);
                    }
                }
                KEY_MIN_STOCK => {
                    if let Ok(threshold) = value.parse() {
                        cfg.min_stock_threshold = threshold;
                    }
                }
                _ => {}
            }
        }

        Ok(cfg)
    }

    /// Persists the configuration.
    pub async fn save(&self, cfg: &Configuration) -> StoreResult<()> {
        let pairs = [
            (KEY_CARD_FEE, cfg.card_fee.bps().to_string()),
            (KEY_TAX, cfg.tax.bps().to_string()),
            (KEY_TARGET_MARGIN, cfg.target_margin.bps().to_string()),
            (KEY_MIN_STOCK, cfg.min_stock_threshold.to_string()),
        ];

        for (key, value) in pairs {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalStore;

    #[tokio::test]
    async fn test_load_empty_gives_defaults() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let cfg = store.settings().load().await.unwrap();
        assert_eq!(cfg, Configuration::default());
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let repo = store.settings();

        let cfg = Configuration {
            card_fee: Rate::from_bps(420),
            tax: Rate::from_bps(800),
            target_margin: Rate::from_bps(3500),
            min_stock_threshold: 8,
        };
        repo.save(&cfg).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, cfg);
    }
}
