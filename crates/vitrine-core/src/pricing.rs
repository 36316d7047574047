//! # Suggested Price Calculation
//!
//! The markup formula used for suggested sale prices.
//!
//! ## Formula
//! ```text
//! CC     = product cost + freight + other costs        (purchase cost)
//! CO     = monthly expenses / monthly sales            (operating cost share)
//! CMV    = CC + CO                                     (cost of goods sold)
//! markup = 1 / (1 - (card fee + tax + margin))
//! PV     = CMV × markup                                (suggested price)
//! ```
//! Rejected when the combined rates reach 100%: there is no markup that
//! covers them.
//!
//! All arithmetic runs on integer centavos and basis points; the division is
//! rounded half up once, at the end.

use crate::config::Configuration;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Rate;

/// Inputs to a suggested-price calculation.
#[derive(Debug, Clone, Copy)]
pub struct PricingInputs {
    /// Acquisition cost of one unit.
    pub product_cost: Money,
    /// Freight share for one unit.
    pub freight: Money,
    /// Any other per-unit costs.
    pub other_costs: Money,
    /// Fixed monthly expenses to amortize.
    pub monthly_expenses: Money,
    /// Expected sales per month. Must be positive.
    pub monthly_sales: i64,
}

impl PricingInputs {
    /// Bare inputs: just the product cost, nothing amortized.
    pub fn from_cost(product_cost: Money) -> Self {
        PricingInputs {
            product_cost,
            freight: Money::zero(),
            other_costs: Money::zero(),
            monthly_expenses: Money::zero(),
            monthly_sales: 1,
        }
    }
}

/// Result of a suggested-price calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Purchase cost (CC).
    pub purchase_cost: Money,
    /// Per-unit operating cost share (CO).
    pub operating_cost: Money,
    /// Cost of goods sold (CMV).
    pub merchandise_cost: Money,
    /// Suggested sale price (PV).
    pub suggested_price: Money,
    /// Realized margin at the suggested price.
    pub real_margin: Rate,
}

/// Computes the suggested sale price for the given inputs and configuration.
pub fn suggested_price(inputs: PricingInputs, cfg: &Configuration) -> CoreResult<PriceBreakdown> {
    if inputs.product_cost.is_negative() || inputs.product_cost.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "product_cost".to_string(),
        }
        .into());
    }
    if inputs.monthly_sales <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "monthly_sales".to_string(),
        }
        .into());
    }

    let total_bps = cfg.combined_rate_bps();
    if total_bps >= 10_000 {
        return Err(CoreError::RatesTooHigh { total_bps });
    }

    let purchase_cost = inputs.product_cost + inputs.freight + inputs.other_costs;

    // Half-up division for the per-unit expense share.
    let operating_cost = Money::from_cents(
        (inputs.monthly_expenses.cents() + inputs.monthly_sales / 2) / inputs.monthly_sales,
    );

    let merchandise_cost = purchase_cost + operating_cost;

    // PV = CMV / (1 - rates), in centavos: CMV × 10000 / (10000 - bps)
    let denom = (10_000 - total_bps) as i128;
    let num = merchandise_cost.cents() as i128 * 10_000;
    let suggested = Money::from_cents(((num + denom / 2) / denom) as i64);

    // Realized margin: (PV - CMV) / PV
    let real_margin = if suggested.is_zero() {
        Rate::zero()
    } else {
        let margin_bps =
            (suggested.cents() - merchandise_cost.cents()) as i128 * 10_000 / suggested.cents() as i128;
        Rate::from_bps(margin_bps.max(0) as u32)
    };

    Ok(PriceBreakdown {
        purchase_cost,
        operating_cost,
        merchandise_cost,
        suggested_price: suggested,
        real_margin,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
