//! # Pricing Commands
//!
//! `preco calc`: the live calculation.
//!
//! ## Lenient vs Strict
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    calc modes                                           │
//! │                                                                         │
//! │  preco calc --base-cost abc --margin 25                                 │
//! │       │                                                                 │
//! │       ├── (default) PricingForm::preview                                │
//! │       │      "abc" counts as 0, negative costs count as 0               │
//! │       │      only an impossible tax rate fails                          │
//! │       │                                                                 │
//! │       └── --strict / --record NAME   PricingForm::validate_for          │
//! │              every bad field is reported, nothing is computed           │
//! │              --record also appends the result to the history            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use super::calculation::CalculationDto;
use super::{breakdown_rows, render_rows, PricingDto, Report};
use crate::error::ApiError;
use crate::state::{AppContext, ConfigState};
use preco_core::validation::validate_product_name;
use preco_core::{
    AdditionalCostField, Calculation, FormErrors, MarginMode, PricingForm, PricingTerms, TaxPolicy,
    ValidationError,
};
use preco_db::generate_id;

// =============================================================================
// Arguments
// =============================================================================

/// `--margin-mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MarginModeArg {
    /// Percentage of total cost
    #[default]
    Percentage,
    /// Fixed amount added to total cost
    Fixed,
}

impl From<MarginModeArg> for MarginMode {
    fn from(arg: MarginModeArg) -> Self {
        match arg {
            MarginModeArg::Percentage => MarginMode::Percentage,
            MarginModeArg::Fixed => MarginMode::Fixed,
        }
    }
}

/// The form fields, as typed.
#[derive(Debug, Clone, Default, Args)]
pub struct PricingArgs {
    /// Base cost, e.g. 800 or 1.234,56
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub base_cost: String,

    /// Additional cost, as VALUE or DESCRIPTION=VALUE (repeatable)
    #[arg(long = "cost", value_name = "[DESCRIPTION=]VALUE", allow_hyphen_values = true)]
    pub costs: Vec<String>,

    /// How --margin is applied
    #[arg(long, value_enum, default_value_t = MarginModeArg::Percentage)]
    pub margin_mode: MarginModeArg,

    /// Margin value (default: PRECO_DEFAULT_MARGIN or 25)
    #[arg(long, allow_hyphen_values = true)]
    pub margin: Option<String>,

    /// Tax percentage (default: PRECO_DEFAULT_TAX or 18)
    #[arg(long, allow_hyphen_values = true)]
    pub tax: Option<String>,
}

impl PricingArgs {
    /// Builds the form, filling omitted margin/tax from config.
    pub fn to_form(&self, config: &ConfigState) -> PricingForm {
        PricingForm {
            base_cost: self.base_cost.clone(),
            additional_costs: self.costs.iter().map(|c| parse_cost_arg(c)).collect(),
            margin_mode: self.margin_mode.into(),
            margin_value: self
                .margin
                .clone()
                .unwrap_or_else(|| config.default_margin.clone()),
            tax_percentage: self
                .tax
                .clone()
                .unwrap_or_else(|| config.default_tax.clone()),
        }
    }
}

/// Splits `DESCRIPTION=VALUE` on the last `=`.
///
/// ```text
/// "Frete=25"      → ("Frete", "25")
/// "15,50"         → ("", "15,50")
/// "a=b=3"         → ("a=b", "3")
/// ```
pub fn parse_cost_arg(arg: &str) -> AdditionalCostField {
    match arg.rsplit_once('=') {
        Some((description, value)) => AdditionalCostField::new(description.trim(), value.trim()),
        None => AdditionalCostField::new("", arg.trim()),
    }
}

#[derive(Debug, Clone, Args)]
pub struct CalcArgs {
    #[command(flatten)]
    pub pricing: PricingArgs,

    /// Reject unparsable or negative fields instead of counting them as 0
    #[arg(long)]
    pub strict: bool,

    /// Append the result to the history under this name (implies --strict)
    #[arg(long, value_name = "NAME")]
    pub record: Option<String>,
}

// =============================================================================
// Output
// =============================================================================

/// Result of `preco calc`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub tax_policy: TaxPolicy,
    pub margin_mode: MarginMode,
    pub margin_value: Decimal,
    pub tax_percentage: Decimal,
    pub pricing: PricingDto,
}

impl Report for Breakdown {
    fn render(&self, config: &ConfigState) -> String {
        let mut rows = breakdown_rows(config, &self.pricing, self.tax_percentage);
        rows.push(("Tax policy".to_string(), self.tax_policy.to_string()));
        render_rows(&rows)
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Strict form validation merged after `errors` already found on other
/// fields, so one run reports every failure.
pub(crate) fn validate_terms(
    form: &PricingForm,
    policy: TaxPolicy,
    mut errors: Vec<ValidationError>,
) -> Result<PricingTerms, ApiError> {
    let result = form.validate_for(policy);
    if let Err(form_errors) = &result {
        errors.extend(form_errors.errors().iter().cloned());
    }
    match FormErrors::from_errors(errors) {
        Some(errors) => Err(errors.into()),
        None => result.map_err(ApiError::from),
    }
}

/// Computes the breakdown for the typed fields.
///
/// ## Errors
/// - Lenient: only an out-of-range tax rate (or overflow)
/// - `strict`: every invalid field, as `VALIDATION_ERROR`
pub fn calculate(
    config: &ConfigState,
    policy: TaxPolicy,
    args: &CalcArgs,
) -> Result<Breakdown, ApiError> {
    let start = Instant::now();
    let form = args.pricing.to_form(config);

    let (input, result) = if args.strict {
        let terms = form.validate_for(policy)?;
        let result = terms.price(policy)?;
        (terms.to_input(), result)
    } else {
        let input = form.lenient_input();
        let result = preco_core::compute(&input, policy)?;
        (input, result)
    };

    debug!(
        elapsed_us = start.elapsed().as_micros() as u64,
        policy = %policy,
        strict = args.strict,
        "calc complete"
    );

    Ok(Breakdown {
        tax_policy: policy,
        margin_mode: input.margin_mode,
        margin_value: input.margin_value,
        tax_percentage: input.tax_percentage,
        pricing: result.into(),
    })
}

/// Strictly validates, prices and appends a standalone history entry.
pub async fn record(
    ctx: &AppContext,
    policy: TaxPolicy,
    args: &CalcArgs,
    name: &str,
) -> Result<CalculationDto, ApiError> {
    let form = args.pricing.to_form(&ctx.config);

    let mut errors = Vec::new();
    if let Err(e) = validate_product_name(name) {
        errors.push(e);
    }
    let terms = validate_terms(&form, policy, errors)?;

    let calculation = Calculation::standalone(generate_id(), name, terms, policy, Utc::now())?;
    ctx.db.inner().calculations().insert(&calculation).await?;

    info!(id = %calculation.id, policy = %policy, "Recorded standalone calculation");
    Ok(calculation.into())
}

// =============================================================================
// Unit Tests
// =============================================================================
