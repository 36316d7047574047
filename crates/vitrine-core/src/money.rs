//! # Money Module
//!
//! Monetary values in integer centavos.
//!
//! ## Why Integer Money?
//! ```text
//! In floating point:   0.1 + 0.2 = 0.30000000000000004
//! In centavos:         10 + 20   = 30
//! ```
//! Every monetary value in the system (product cost, suggested price, sale
//! totals, discounts, fees) flows through this type. The database, the queue
//! payloads, and the wire all carry centavos; only display formatting
//! converts to reais.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values appear in discount math and refunds
/// - **Single-field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -R$ 5,50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked subtraction, `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiplies by a quantity, saturating at the numeric bounds.
    ///
    /// Used for line totals (`unit_price × quantity`), where quantities are
    /// bounded by validation well below any overflow point.
    #[inline]
    pub fn saturating_mul(self, qty: i64) -> Money {
        Money(self.0.saturating_mul(qty))
    }

    /// Applies a basis-point rate with half-up rounding.
    ///
    /// `Money::from_cents(10_000).apply_bps(350)` is 350 centavos (3.5%).
    pub fn apply_bps(self, bps: u32) -> Money {
        let num = self.0 as i128 * bps as i128;
        let half = if num >= 0 { 5_000 } else { -5_000 };
        Money(((num + half) / 10_000) as i64)
    }
}

// =============================================================================
// Arithmetic Operators
// =============================================================================

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, qty: i64) -> Money {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Display
// =============================================================================

/// Formats as Brazilian currency: `R$ 10,99`, `-R$ 5,50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}R$ {},{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1099);
        assert_eq!(m.cents(), 1099);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((b * 3).cents(), 750);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_apply_bps() {
        // 3.5% of R$ 100,00
        assert_eq!(Money::from_cents(10_000).apply_bps(350).cents(), 350);
        // Rounds half up: 8.25% of R$ 10,99 = 90.6675 -> 91
        assert_eq!(Money::from_cents(1099).apply_bps(825).cents(), 91);
        assert_eq!(Money::zero().apply_bps(5000).cents(), 0);
    }

    #[test]
    fn test_display_brl() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(5).to_string(), "R$ 0,05");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::from_cents(123456).to_string(), "R$ 1234,56");
    }

    #[test]
    fn test_serde_transparent() {
        let m = Money::from_cents(420);
        assert_eq!(serde_json::to_string(&m).unwrap(), "420");
        let back: Money = serde_json::from_str("420").unwrap();
        assert_eq!(back, m);
    }
}
