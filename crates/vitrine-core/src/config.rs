//! # Shop Configuration
//!
//! The scalar configuration values consumed by the pricing and stock-alert
//! collaborators, as one explicit value object.
//!
//! These values persist in the local store's `settings` key space and are
//! loaded into a [`Configuration`] that is passed to whoever needs it. No
//! component reads configuration out of ambient storage on its own.

use serde::{Deserialize, Serialize};

use crate::types::{Rate, DEFAULT_MIN_STOCK};

/// Shop-wide configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Card processing fee. Default 3.5%.
    pub card_fee: Rate,

    /// Sales tax. Default 6%.
    pub tax: Rate,

    /// Target profit margin for suggested prices. Default 40%.
    pub target_margin: Rate,

    /// Stock level at or below which a product counts as low-stock.
    /// Default 5. Applied to new products as their threshold.
    pub min_stock_threshold: i64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            card_fee: Rate::from_bps(350),
            tax: Rate::from_bps(600),
            target_margin: Rate::from_bps(4000),
            min_stock_threshold: DEFAULT_MIN_STOCK,
        }
    }
}

impl Configuration {
    /// Sum of all rates that must fit under 100% for pricing to work.
    pub fn combined_rate_bps(&self) -> u32 {
        self.card_fee.bps() + self.tax.bps() + self.target_margin.bps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Configuration::default();
        assert_eq!(cfg.card_fee.bps(), 350);
        assert_eq!(cfg.tax.bps(), 600);
        assert_eq!(cfg.target_margin.bps(), 4000);
        assert_eq!(cfg.min_stock_threshold, 5);
    }

    #[test]
    fn test_combined_rate() {
        assert_eq!(Configuration::default().combined_rate_bps(), 4950);
    }
}
