//! # Repository Module
//!
//! Database repository implementations for Preço.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                            │
//! │       │  db.products().search("cadeira")                                │
//! │       ▼                                                                 │
//! │  ProductRepository / CalculationRepository                              │
//! │       │  Record (FromRow, all TEXT) ──TryFrom──► Product / Calculation  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both tables share the pricing-terms and pricing-result columns; the
//! [`TermsColumns`] and [`PricingColumns`] records below convert them.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Saved products
//! - [`CalculationRepository`](calculation::CalculationRepository) - Append-only history

pub mod calculation;
pub mod product;

use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use preco_core::{AdditionalCost, MarginMode, Money, PricingResult, PricingTerms};

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Generates a new record ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a stored decimal column.
pub(crate) fn decimal_column(field: &str, text: &str) -> DbResult<Decimal> {
    Decimal::from_str(text.trim()).map_err(|e| DbError::decode(field, e))
}

fn money_column(field: &str, text: &str) -> DbResult<Money> {
    decimal_column(field, text).map(Money::new)
}

// =============================================================================
// Shared Column Groups
// =============================================================================

/// `base_cost .. tax_percentage` as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TermsColumns {
    pub base_cost: String,
    pub additional_costs: String,
    pub margin_mode: MarginMode,
    pub margin_value: String,
    pub tax_percentage: String,
}

impl TermsColumns {
    pub fn from_terms(terms: &PricingTerms) -> DbResult<Self> {
        let additional_costs = serde_json::to_string(&terms.additional_costs)
            .map_err(|e| DbError::Internal(format!("Failed to encode additional_costs: {}", e)))?;

        Ok(TermsColumns {
            base_cost: terms.base_cost.amount().to_string(),
            additional_costs,
            margin_mode: terms.margin_mode,
            margin_value: terms.margin_value.to_string(),
            tax_percentage: terms.tax_percentage.to_string(),
        })
    }

    pub fn into_terms(self) -> DbResult<PricingTerms> {
        let additional_costs: Vec<AdditionalCost> = serde_json::from_str(&self.additional_costs)
            .map_err(|e| DbError::decode("additional_costs", e))?;

        Ok(PricingTerms {
            base_cost: money_column("base_cost", &self.base_cost)?,
            additional_costs,
            margin_mode: self.margin_mode,
            margin_value: decimal_column("margin_value", &self.margin_value)?,
            tax_percentage: decimal_column("tax_percentage", &self.tax_percentage)?,
        })
    }

    /// Binds the five columns in declaration order.
    pub fn bind(self, query: SqliteQuery<'_>) -> SqliteQuery<'_> {
        query
            .bind(self.base_cost)
            .bind(self.additional_costs)
            .bind(self.margin_mode)
            .bind(self.margin_value)
            .bind(self.tax_percentage)
    }
}

/// `total_cost .. final_price` as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PricingColumns {
    pub total_cost: String,
    pub profit_amount: String,
    pub profit_percentage: String,
    pub price_before_tax: String,
    pub tax_amount: String,
    pub final_price: String,
}

impl PricingColumns {
    pub fn from_result(result: &PricingResult) -> Self {
        PricingColumns {
            total_cost: result.total_cost.amount().to_string(),
            profit_amount: result.profit_amount.amount().to_string(),
            profit_percentage: result.profit_percentage.to_string(),
            price_before_tax: result.price_before_tax.amount().to_string(),
            tax_amount: result.tax_amount.amount().to_string(),
            final_price: result.final_price.amount().to_string(),
        }
    }

    pub fn into_result(self) -> DbResult<PricingResult> {
        Ok(PricingResult {
            total_cost: money_column("total_cost", &self.total_cost)?,
            profit_amount: money_column("profit_amount", &self.profit_amount)?,
            profit_percentage: decimal_column("profit_percentage", &self.profit_percentage)?,
            price_before_tax: money_column("price_before_tax", &self.price_before_tax)?,
            tax_amount: money_column("tax_amount", &self.tax_amount)?,
            final_price: money_column("final_price", &self.final_price)?,
        })
    }

    /// Binds the six columns in declaration order.
    pub fn bind(self, query: SqliteQuery<'_>) -> SqliteQuery<'_> {
        query
            .bind(self.total_cost)
            .bind(self.profit_amount)
            .bind(self.profit_percentage)
            .bind(self.price_before_tax)
            .bind(self.tax_amount)
            .bind(self.final_price)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
