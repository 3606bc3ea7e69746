//! # Pricing Module
//!
//! The price calculator: cost basis + margin + tax → final price.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      compute(input, policy)                             │
//! │                                                                         │
//! │  base_cost ─┐                                                          │
//! │             ├──► total_cost ──► + profit_amount ──► price_before_tax   │
//! │  extras ────┘        │               ▲                     │            │
//! │                      │               │                     ▼            │
//! │                      └── margin ─────┘              tax policy          │
//! │                  (percentage | fixed)               ├── OnPreTaxPrice   │
//! │                                                     │   tax = p × t     │
//! │                                                     └── GrossUp         │
//! │                                                         final = p/(1-t) │
//! │                                                            │            │
//! │                                                            ▼            │
//! │                                            final_price = p + tax        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Tax Policies
//! The same inputs produce different prices under each policy, so the
//! policy is always passed in explicitly and stored on every record.
//!
//! | Inputs: 800 + [25, 15], 25% margin, 18% tax | on pre-tax | gross-up |
//! |---------------------------------------------|-----------:|---------:|
//! | price_before_tax                            |    1050.00 |  1050.00 |
//! | tax_amount                                  |     189.00 |   230.49 |
//! | final_price                                 |    1239.00 |  1280.49 |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::PricingError;
use crate::money::{Money, CURRENCY_DECIMALS};

// =============================================================================
// Margin Mode
// =============================================================================

/// How `margin_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MarginMode {
    /// Percentage of total cost (25 = 25%).
    #[default]
    Percentage,
    /// Fixed currency amount added to total cost.
    Fixed,
}

impl fmt::Display for MarginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarginMode::Percentage => "percentage",
            MarginMode::Fixed => "fixed",
        })
    }
}

// =============================================================================
// Tax Policy
// =============================================================================

/// How a tax percentage relates the pre-tax price to the final price.
///
/// There is deliberately no `Default`: callers must choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxPolicy {
    /// Tax is a percentage of the pre-tax price (additive).
    ///
    /// `tax = price_before_tax × t / 100`
    OnPreTaxPrice,

    /// Tax is a percentage of the final price (gross-up).
    ///
    /// `final = price_before_tax / (1 - t / 100)`
    GrossUp,
}

impl TaxPolicy {
    /// Exclusive upper bound on the tax percentage, if the policy has one.
    pub fn max_tax_percentage(&self) -> Option<Decimal> {
        match self {
            TaxPolicy::OnPreTaxPrice => None,
            TaxPolicy::GrossUp => Some(Decimal::ONE_HUNDRED),
        }
    }

    /// Checks that `rate` can be applied under this policy.
    pub fn accepts(&self, rate: Decimal) -> bool {
        if rate.is_sign_negative() && !rate.is_zero() {
            return false;
        }
        match self.max_tax_percentage() {
            Some(max) => rate < max,
            None => true,
        }
    }
}

impl fmt::Display for TaxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxPolicy::OnPreTaxPrice => "on-pre-tax-price",
            TaxPolicy::GrossUp => "gross-up",
        })
    }
}

impl FromStr for TaxPolicy {
    type Err = String;

    /// Accepts the display name, the serde name, or the short aliases
    /// `additive` and `inclusive`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "on-pre-tax-price" | "on-pre-tax" | "additive" => Ok(TaxPolicy::OnPreTaxPrice),
            "gross-up" | "inclusive" => Ok(TaxPolicy::GrossUp),
            other => Err(format!(
                "unknown tax policy '{}': expected on-pre-tax-price or gross-up",
                other
            )),
        }
    }
}

// =============================================================================
// Input & Result
// =============================================================================

/// Everything the calculator needs, already parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingInput {
    /// Acquisition or production cost.
    pub base_cost: Money,

    /// Extra itemized costs (freight, packaging), in entry order.
    pub additional_costs: Vec<Money>,

    /// How `margin_value` is read.
    pub margin_mode: MarginMode,

    /// Percentage points or currency amount, per `margin_mode`.
    #[ts(type = "string")]
    pub margin_value: Decimal,

    /// Tax percentage points (18 = 18%).
    #[ts(type = "string")]
    pub tax_percentage: Decimal,
}

/// The derived price breakdown.
///
/// ## Invariants
/// - `total_cost = base_cost + Σ additional_costs`
/// - `price_before_tax = total_cost + profit_amount`
/// - `final_price = price_before_tax + tax_amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingResult {
    pub total_cost: Money,
    pub profit_amount: Money,
    /// Profit relative to total cost, in percentage points.
    #[ts(type = "string")]
    pub profit_percentage: Decimal,
    pub price_before_tax: Money,
    pub tax_amount: Money,
    pub final_price: Money,
}

impl PricingResult {
    /// Returns a copy rounded to `dp` decimal places that keeps both sum
    /// invariants exact.
    ///
    /// `total_cost`, `profit_amount` and `tax_amount` are rounded; the two
    /// sums are rebuilt from them.
    pub fn rounded(&self, dp: u32) -> PricingResult {
        let total_cost = self.total_cost.round_dp(dp);
        let profit_amount = self.profit_amount.round_dp(dp);
        let price_before_tax = total_cost + profit_amount;
        let tax_amount = self.tax_amount.round_dp(dp);
        PricingResult {
            total_cost,
            profit_amount,
            profit_percentage: Money::new(self.profit_percentage).round_dp(dp).amount(),
            price_before_tax,
            tax_amount,
            final_price: price_before_tax + tax_amount,
        }
    }

    /// Rounded to centavos for display.
    pub fn for_display(&self) -> PricingResult {
        self.rounded(CURRENCY_DECIMALS)
    }
}

// =============================================================================
// Price Calculator
// =============================================================================

/// A calculator bound to one tax policy.
///
/// ## Example
/// ```rust
/// use preco_core::pricing::{MarginMode, PriceCalculator, PricingInput, TaxPolicy};
/// use preco_core::money::Money;
/// use rust_decimal::Decimal;
///
/// let calculator = PriceCalculator::new(TaxPolicy::OnPreTaxPrice);
/// let input = PricingInput {
///     base_cost: Money::new(Decimal::from(150)),
///     additional_costs: vec![],
///     margin_mode: MarginMode::Fixed,
///     margin_value: Decimal::from(45),
///     tax_percentage: Decimal::from(18),
/// };
/// let result = calculator.compute(&input).unwrap();
/// assert_eq!(result.final_price.to_string(), "230.10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCalculator {
    policy: TaxPolicy,
}

impl PriceCalculator {
    pub const fn new(policy: TaxPolicy) -> Self {
        PriceCalculator { policy }
    }

    pub const fn policy(&self) -> TaxPolicy {
        self.policy
    }

    pub fn compute(&self, input: &PricingInput) -> Result<PricingResult, PricingError> {
        compute(input, self.policy)
    }
}

/// Converts a [`PricingInput`] into a [`PricingResult`] under `policy`.
///
/// Pure and deterministic: the same input and policy always give the same
/// result.
///
/// ## Errors
/// - [`PricingError::InvalidInput`] when `base_cost` or an additional cost
///   is negative
/// - [`PricingError::InvalidTaxRate`] when the tax percentage is negative,
///   or is 100 or more under [`TaxPolicy::GrossUp`]
/// - [`PricingError::Overflow`] when an amount leaves the decimal range
pub fn compute(input: &PricingInput, policy: TaxPolicy) -> Result<PricingResult, PricingError> {
    if input.base_cost.is_negative() {
        return Err(PricingError::negative("base_cost"));
    }
    if let Some(i) = input.additional_costs.iter().position(Money::is_negative) {
        return Err(PricingError::negative(format!("additional_costs[{}]", i)));
    }
    if !policy.accepts(input.tax_percentage) {
        return Err(PricingError::InvalidTaxRate {
            rate: input.tax_percentage,
            policy,
        });
    }

    // 1. Cost basis
    let total_cost = input
        .additional_costs
        .iter()
        .try_fold(input.base_cost.amount(), |acc, c| acc.checked_add(c.amount()))
        .ok_or(PricingError::Overflow { step: "total_cost" })?;
    let total_cost = Money::new(total_cost);

    // 2. Margin
    let profit_amount = match input.margin_mode {
        MarginMode::Percentage => total_cost
            .percent(input.margin_value)
            .ok_or(PricingError::Overflow { step: "profit_amount" })?,
        MarginMode::Fixed => Money::new(input.margin_value),
    };

    // 3. Pre-tax price
    let price_before_tax = total_cost
        .amount()
        .checked_add(profit_amount.amount())
        .map(Money::new)
        .ok_or(PricingError::Overflow { step: "price_before_tax" })?;

    // 4. Tax
    let (tax_amount, final_price) = match policy {
        TaxPolicy::OnPreTaxPrice => {
            let tax = price_before_tax
                .percent(input.tax_percentage)
                .ok_or(PricingError::Overflow { step: "tax_amount" })?;
            let final_price = price_before_tax
                .amount()
                .checked_add(tax.amount())
                .ok_or(PricingError::Overflow { step: "final_price" })?;
            (tax, Money::new(final_price))
        }
        TaxPolicy::GrossUp => {
            let share_kept = Decimal::ONE - input.tax_percentage / Decimal::ONE_HUNDRED;
            let final_price = price_before_tax
                .amount()
                .checked_div(share_kept)
                .ok_or(PricingError::Overflow { step: "final_price" })?;
            let final_price = Money::new(final_price);
            (final_price - price_before_tax, final_price)
        }
    };

    // 5. Profit relative to cost
    let profit_percentage = if total_cost.is_zero() {
        Decimal::ZERO
    } else {
        profit_amount
            .amount()
            .checked_div(total_cost.amount())
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(PricingError::Overflow {
                step: "profit_percentage",
            })?
    };

    Ok(PricingResult {
        total_cost,
        profit_amount,
        profit_percentage,
        price_before_tax,
        tax_amount,
        final_price,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
