//! # Money Module
//!
//! Provides the `Money` type for monetary amounts.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    800 + 25 + 15 = 840, but 0.1 + 0.2 = 0.30000000000000004  ❌         │
//! │                                                                         │
//! │  Integer cents fall short too:                                          │
//! │    gross-up tax divides by (1 - t): 1050 / 0.82 = 1280.4878...          │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Exact base-10 sums, 28 significant digits for the division,          │
//! │    rounding to cents only when a value is displayed                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use preco_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let cost = Money::new(Decimal::new(80000, 2)); // 800.00
//! let freight = Money::new(Decimal::new(25, 0));
//! let total = cost + freight;
//! assert_eq!(total.format("R$", ','), "R$ 825,00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// Number of decimal places in the display currency (centavos).
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the major currency unit (reais), full precision.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values are representable so that
///   validation can reject them with a message instead of a panic
/// - **No rounding on arithmetic**: rounding happens once, at display or
///   snapshot time, via [`Money::round_cents`]
/// - **Serialized as a string**: keeps every digit across JSON
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns `rate` percent of this amount, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use preco_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let pre_tax = Money::new(Decimal::from(1050));
    /// let tax = pre_tax.percent(Decimal::from(18)).unwrap();
    /// assert_eq!(tax.amount(), Decimal::from(189));
    /// ```
    ///
    /// Returns `None` on decimal overflow.
    pub fn percent(&self, rate: Decimal) -> Option<Money> {
        self.0
            .checked_mul(rate)?
            .checked_div(Decimal::ONE_HUNDRED)
            .map(Money)
    }

    /// Rounds to whole centavos, half away from zero.
    ///
    /// This matches `Number.toFixed(2)` for the values the app handles.
    pub fn round_cents(&self) -> Money {
        self.round_dp(CURRENCY_DECIMALS)
    }

    /// Rounds to `dp` decimal places, half away from zero.
    pub fn round_dp(&self, dp: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats the amount for display with a currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use preco_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::new(Decimal::new(123910, 2));
    /// assert_eq!(price.format("R$", ','), "R$ 1239,10");
    /// assert_eq!(price.format("$", '.'), "$ 1239.10");
    /// ```
    pub fn format(&self, symbol: &str, decimal_separator: char) -> String {
        let mut digits = self.round_cents().0.abs();
        digits.rescale(CURRENCY_DECIMALS);
        let text = digits.to_string();
        let text = if decimal_separator == '.' {
            text
        } else {
            text.replace('.', &decimal_separator.to_string())
        };
        let sign = if self.round_cents().is_negative() { "-" } else { "" };
        format!("{}{} {}", sign, symbol, text)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount rounded to centavos, without a symbol.
///
/// ## Note
/// Use [`Money::format`] for user-facing output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_cents().0;
        rounded.rescale(CURRENCY_DECIMALS);
        write!(f, "{}", rounded)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Money::new(dec!(10.99)).to_string(), "10.99");
        assert_eq!(Money::new(dec!(5)).to_string(), "5.00");
        assert_eq!(Money::new(dec!(1280.4878048780)).to_string(), "1280.49");
        assert_eq!(Money::new(dec!(-5.5)).to_string(), "-5.50");
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(Money::new(dec!(1239)).format("R$", ','), "R$ 1239,00");
        assert_eq!(Money::new(dec!(230.1)).format("R$", ','), "R$ 230,10");
        assert_eq!(Money::new(dec!(-4.5)).format("$", '.'), "-$ 4.50");
        assert_eq!(Money::zero().format("R$", ','), "R$ 0,00");
    }

    #[test]
    fn test_tiny_negative_formats_without_sign() {
        assert_eq!(Money::new(dec!(-0.001)).format("R$", ','), "R$ 0,00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::new(dec!(800));
        let b = Money::new(dec!(25));
        assert_eq!((a + b).amount(), dec!(825));
        assert_eq!((a - b).amount(), dec!(775));

        let extras = [Money::new(dec!(25)), Money::new(dec!(15))];
        let total: Money = extras.iter().sum();
        assert_eq!(total.amount(), dec!(40));
    }

    #[test]
    fn test_percent() {
        let amount = Money::new(dec!(840));
        assert_eq!(amount.percent(dec!(25)).unwrap().amount(), dec!(210));
        assert_eq!(Money::new(dec!(195)).percent(dec!(18)).unwrap().amount(), dec!(35.10));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Money::new(dec!(0.125)).round_cents().amount(), dec!(0.13));
        assert_eq!(Money::new(dec!(-0.125)).round_cents().amount(), dec!(-0.13));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::new(dec!(-0.01)).is_negative());
        assert!(!Money::new(dec!(0.01)).is_negative());
    }
}
