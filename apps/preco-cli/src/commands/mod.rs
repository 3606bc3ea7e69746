//! # Commands Module
//!
//! Every `preco` subcommand, plus the shared output plumbing.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (Report trait, shared DTOs)
//! ├── pricing.rs      ◄─── calc (live preview, --strict, --record)
//! ├── product.rs      ◄─── product add/update/list/show/delete
//! └── calculation.rs  ◄─── history list/show/delete/clear
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  preco --tax-policy gross-up product add --name Cadeira --base-cost 800 │
//! │         │                                                               │
//! │         ▼  (clap)                                                       │
//! │  lib::run(cli)                                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::product::add(&ctx, policy, &args)                            │
//! │      -> Result<ProductDto, ApiError>                                    │
//! │         │                                                               │
//! │         ▼  (Report)                                                     │
//! │  --json ? serde_json::to_string_pretty(&dto) : dto.render(&config)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State (Option B)
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs config
//! fn calculate(config: &ConfigState, policy: TaxPolicy, args: &CalcArgs)
//!
//! // Needs the database too
//! async fn add(ctx: &AppContext, policy: TaxPolicy, args: &AddArgs)
//! ```

pub mod calculation;
pub mod pricing;
pub mod product;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::ConfigState;
use preco_core::validation::validate_record_id;
use preco_core::{AdditionalCost, FormErrors, Money, PricingResult};

// =============================================================================
// Report
// =============================================================================

/// A command result that can be printed as text or JSON.
pub trait Report: Serialize {
    /// Human-readable rendering.
    fn render(&self, config: &ConfigState) -> String;
}

/// Renders a report for stdout.
pub fn output<R: Report>(report: &R, config: &ConfigState, json: bool) -> Result<String, ApiError> {
    if json {
        serde_json::to_string_pretty(report)
            .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))
    } else {
        Ok(report.render(config))
    }
}

/// Result of a delete command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub kind: &'static str,
    pub id: String,
}

impl Report for Deleted {
    fn render(&self, _config: &ConfigState) -> String {
        format!("Deleted {} {}", self.kind, self.id)
    }
}

/// Checks an id argument before it reaches the database.
pub(crate) fn record_id(field: &str, id: &str) -> Result<String, ApiError> {
    validate_record_id(field, id).map_err(|e| FormErrors::from(e).into())
}

// =============================================================================
// Shared DTOs
// =============================================================================

/// Computed price breakdown, rounded to centavos.
///
/// Storage keeps full precision; this is what gets shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDto {
    pub total_cost: Money,
    pub profit_amount: Money,
    pub profit_percentage: Decimal,
    pub price_before_tax: Money,
    pub tax_amount: Money,
    pub final_price: Money,
}

impl From<PricingResult> for PricingDto {
    fn from(result: PricingResult) -> Self {
        let r = result.for_display();
        PricingDto {
            total_cost: r.total_cost,
            profit_amount: r.profit_amount,
            profit_percentage: r.profit_percentage,
            price_before_tax: r.price_before_tax,
            tax_amount: r.tax_amount,
            final_price: r.final_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalCostDto {
    pub description: String,
    pub value: Money,
}

impl From<AdditionalCost> for AdditionalCostDto {
    fn from(cost: AdditionalCost) -> Self {
        AdditionalCostDto {
            description: cost.description,
            value: cost.value,
        }
    }
}

// =============================================================================
// Text Helpers
// =============================================================================

/// Label/value rows of a price breakdown.
pub(crate) fn breakdown_rows(
    config: &ConfigState,
    pricing: &PricingDto,
    tax_percentage: Decimal,
) -> Vec<(String, String)> {
    vec![
        ("Total cost".to_string(), config.format_money(pricing.total_cost)),
        (
            format!("Profit ({})", config.format_percent_fixed(pricing.profit_percentage)),
            config.format_money(pricing.profit_amount),
        ),
        (
            "Price before tax".to_string(),
            config.format_money(pricing.price_before_tax),
        ),
        (
            format!("Tax ({})", config.format_percent(tax_percentage, 2)),
            config.format_money(pricing.tax_amount),
        ),
        ("Final price".to_string(), config.format_money(pricing.final_price)),
    ]
}

/// Aligns rows into `label   value` lines.
pub(crate) fn render_rows(rows: &[(String, String)]) -> String {
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{:<width$}  {}", format!("{}:", label), value, width = width + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `14/10/2026 09:30 UTC`
pub(crate) fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M UTC").to_string()
}

/// `desc: R$ x, desc: R$ y`, or `none`.
pub(crate) fn join_costs(config: &ConfigState, costs: &[AdditionalCostDto]) -> String {
    if costs.is_empty() {
        return "none".to_string();
    }
    costs
        .iter()
        .map(|c| {
            let description = if c.description.is_empty() {
                "(no description)"
            } else {
                c.description.as_str()
            };
            format!("{}: {}", description, config.format_money(c.value))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================
