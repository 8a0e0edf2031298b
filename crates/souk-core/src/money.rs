//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Rounding Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHERE ROUNDING HAPPENS                                                 │
//! │                                                                         │
//! │  price_at_purchase × quantity ──► round_currency ──► line total         │
//! │                                        │                                │
//! │                                        ▼                                │
//! │  order.total_amount = Σ (already-rounded line totals)                   │
//! │                                                                         │
//! │  Rounding the final sum instead of each line is NOT allowed: the        │
//! │  stored total must equal the sum of the per-line totals a customer      │
//! │  sees, cent for cent.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding is round-half-up (midpoint away from zero) at 2 fractional
//! digits: 9.995 → 10.00, never 9.99.
//!
//! ## Usage
//! ```rust
//! use souk_core::money::Money;
//!
//! let price: Money = "9.995".parse().unwrap();
//! assert_eq!(price.round_currency().to_string(), "10.00");
//!
//! let line = price.line_total(2); // (9.995 × 2) rounded
//! assert_eq!(line.to_string(), "19.99");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::MoneyError;
use crate::CURRENCY_SCALE;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value backed by a fixed-point decimal.
///
/// ## Design Decisions
/// - **`Decimal` (not float)**: exact fixed-point arithmetic; 0.1 + 0.2 is
///   exactly 0.3.
/// - **Single field tuple struct**: zero-cost wrapper, so raw decimals never
///   leak into signatures that mean "money".
/// - **String serialization**: serializes as `"12.50"` on the wire, matching
///   the stored TEXT representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a raw decimal as money.
    #[inline]
    pub fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    #[inline]
    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Rounds to currency precision (2 fractional digits), half-up.
    ///
    /// Half-up means midpoints round away from zero, the way a shop charges:
    /// 9.995 becomes 10.00. Banker's rounding (half-to-even) would make the
    /// stored total drift from the per-line totals shown to the customer.
    ///
    /// ## Example
    /// ```rust
    /// use souk_core::money::Money;
    ///
    /// let m: Money = "2.675".parse().unwrap();
    /// assert_eq!(m.round_currency().to_string(), "2.68");
    /// ```
    pub fn round_currency(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies by a quantity without rounding.
    ///
    /// Use [`Money::line_total`] when the result is persisted or summed.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Money {
        Money(self.0 * Decimal::from(qty))
    }

    /// Computes a line total: `round_currency(self × qty)`.
    ///
    /// Every persisted line total must come through here (or through an
    /// explicit `round_currency`) before being accumulated into an order
    /// total.
    #[inline]
    pub fn line_total(&self, qty: i64) -> Money {
        self.multiply_quantity(qty).round_currency()
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display prints the exact decimal value, e.g. `12.50`.
///
/// Persisted values are always 2-digit (they pass through `round_currency`
/// first), so this doubles as the database TEXT encoding.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a decimal string such as `"12.50"` or `"9.995"`.
impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|_| MoneyError(s.to_string()))
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

/// Summing an iterator of money values (e.g. rounded line totals).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(money("10.00").to_string(), "10.00");
        assert_eq!(money(" 5.5 ").to_string(), "5.5");
        assert!("not-money".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn test_round_half_up_at_cent_boundary() {
        // The midpoint must round AWAY from zero, not to even.
        assert_eq!(money("9.995").round_currency(), money("10.00"));
        assert_eq!(money("2.675").round_currency(), money("2.68"));
        assert_eq!(money("2.665").round_currency(), money("2.67"));
        assert_eq!(money("-9.995").round_currency(), money("-10.00"));
    }

    #[test]
    fn test_round_currency_idempotent() {
        let m = money("19.99").round_currency();
        assert_eq!(m.round_currency(), m);
    }

    #[test]
    fn test_line_total_rounds_the_product() {
        // 9.995 × 3 = 29.985 → 29.99 (as one rounded line, not 3 × 10.00)
        assert_eq!(money("9.995").line_total(3), money("29.99"));
        assert_eq!(money("10.00").line_total(2), money("20.00"));
    }

    #[test]
    fn test_arithmetic() {
        let a = money("10.00");
        let b = money("5.00");

        assert_eq!(a + b, money("15.00"));
        assert_eq!(a - b, money("5.00"));
        assert_eq!(a * 3, money("30.00"));

        let mut acc = Money::zero();
        acc += a;
        acc += b;
        assert_eq!(acc, money("15.00"));
    }

    #[test]
    fn test_sum_of_rounded_lines() {
        // Per-line rounding before summation: 3 lines of 0.335 → 0.34 each.
        let total: Money = (0..3).map(|_| money("0.335").round_currency()).sum();
        assert_eq!(total, money("1.02"));

        // Rounding only the final sum would give 1.01 - the forbidden shape.
        assert_eq!(money("0.335").multiply_quantity(3).round_currency(), money("1.01"));
    }

    #[test]
    fn test_zero_and_sign_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(money("0.01").is_positive());
        assert!(money("-0.01").is_negative());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let m = money("12.50");
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"12.50\"");

        let back: Money = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(back, m);
    }
}
