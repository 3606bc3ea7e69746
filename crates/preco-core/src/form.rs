//! # Pricing Form
//!
//! Raw text fields as typed by the user, and the two ways of turning them
//! into numbers.
//!
//! ## Preview vs. Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  User types in "Base cost": "12,"  →  "12,5"  →  "12,5x"                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  preview(policy)         every keystroke                                │
//! │  ├── "12,5x" counts as 0, negatives count as 0                          │
//! │  ├── never fails on a cost/margin field                                 │
//! │  └── still fails on a tax rate the policy cannot apply                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_for(policy)    on Save                                        │
//! │  ├── collects every field error: base_cost, additional_costs[i], ...    │
//! │  └── Ok(PricingTerms) only when the whole form is clean                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::decimal::{parse_decimal, parse_decimal_or_zero};
use crate::error::{FormErrors, PricingError, ValidationError};
use crate::money::Money;
use crate::pricing::{compute, MarginMode, PricingInput, PricingResult, TaxPolicy};
use crate::types::{AdditionalCost, PricingTerms};
use crate::validation::{
    parse_required, validate_cost, validate_description, validate_tax_percentage,
};

/// Original app defaults for a fresh form.
pub const DEFAULT_MARGIN: &str = "25";
pub const DEFAULT_TAX: &str = "18";

/// One additional-cost row of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdditionalCostField {
    pub description: String,
    pub value: String,
}

impl AdditionalCostField {
    pub fn new(description: impl Into<String>, value: impl Into<String>) -> Self {
        AdditionalCostField {
            description: description.into(),
            value: value.into(),
        }
    }
}

/// The price-calculation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingForm {
    pub base_cost: String,
    pub additional_costs: Vec<AdditionalCostField>,
    pub margin_mode: MarginMode,
    pub margin_value: String,
    pub tax_percentage: String,
}

impl Default for PricingForm {
    fn default() -> Self {
        PricingForm {
            base_cost: String::new(),
            additional_costs: Vec::new(),
            margin_mode: MarginMode::Percentage,
            margin_value: DEFAULT_MARGIN.to_string(),
            tax_percentage: DEFAULT_TAX.to_string(),
        }
    }
}

impl PricingForm {
    /// Builds the calculator input the lenient way: anything that does not
    /// parse, and any negative cost, counts as zero. A negative tax rate is
    /// passed through as typed.
    pub fn lenient_input(&self) -> PricingInput {
        PricingInput {
            base_cost: lenient_cost(&self.base_cost),
            additional_costs: self
                .additional_costs
                .iter()
                .map(|c| lenient_cost(&c.value))
                .collect(),
            margin_mode: self.margin_mode,
            margin_value: parse_decimal_or_zero(&self.margin_value),
            tax_percentage: parse_decimal_or_zero(&self.tax_percentage),
        }
    }

    /// Live calculation for display while the user types.
    ///
    /// ## Errors
    /// Only [`PricingError::InvalidTaxRate`] (or overflow). The tax rate is
    /// never clamped: a negative rate fails under both policies, and a rate
    /// of 100 or more fails under gross-up.
    pub fn preview(&self, policy: TaxPolicy) -> Result<PricingResult, PricingError> {
        compute(&self.lenient_input(), policy)
    }

    /// Strict validation of the numeric fields, independent of tax policy.
    ///
    /// ## Rules
    /// - `base_cost`: required, a number, not negative
    /// - `additional_costs[i].value`: required, a number, not negative
    /// - `additional_costs[i].description`: at most 100 characters
    /// - `margin_value`, `tax_percentage`: empty means 0, otherwise a number
    /// - `tax_percentage`: not negative
    pub fn validate(&self) -> Result<PricingTerms, FormErrors> {
        let mut errors = Vec::new();

        let base_cost = check_cost("base_cost", &self.base_cost, &mut errors);

        let mut additional_costs = Vec::with_capacity(self.additional_costs.len());
        for (i, row) in self.additional_costs.iter().enumerate() {
            let field = format!("additional_costs[{}]", i);
            if let Err(e) = validate_description(&format!("{}.description", field), &row.description)
            {
                errors.push(e);
            }
            if let Some(value) = check_cost(&field, &row.value, &mut errors) {
                additional_costs.push(AdditionalCost::new(
                    row.description.trim(),
                    Money::new(value),
                ));
            }
        }

        let margin_value = check_optional("margin_value", &self.margin_value, &mut errors);
        let tax_percentage = check_optional("tax_percentage", &self.tax_percentage, &mut errors);
        if let Some(rate) = tax_percentage {
            if let Err(e) = validate_cost("tax_percentage", rate) {
                errors.push(e);
            }
        }

        if let Some(errors) = FormErrors::from_errors(errors) {
            return Err(errors);
        }

        Ok(PricingTerms {
            base_cost: Money::new(base_cost.unwrap_or_default()),
            additional_costs,
            margin_mode: self.margin_mode,
            margin_value: margin_value.unwrap_or_default(),
            tax_percentage: tax_percentage.unwrap_or_default(),
        })
    }

    /// [`validate`](Self::validate) plus the tax-rate bound of `policy`.
    ///
    /// The bound is reported alongside any other field errors.
    pub fn validate_for(&self, policy: TaxPolicy) -> Result<PricingTerms, FormErrors> {
        match self.validate() {
            Ok(terms) => {
                validate_tax_percentage(terms.tax_percentage, policy)?;
                Ok(terms)
            }
            Err(mut errors) => {
                if errors.for_field("tax_percentage").is_none() {
                    if let Ok(rate) = parse_decimal(&self.tax_percentage) {
                        if let Err(e) = validate_tax_percentage(rate, policy) {
                            errors.push(e);
                        }
                    }
                }
                Err(errors)
            }
        }
    }
}

fn lenient_cost(text: &str) -> Money {
    let value = parse_decimal_or_zero(text);
    if value.is_sign_negative() {
        Money::zero()
    } else {
        Money::new(value)
    }
}

fn check_cost(field: &str, text: &str, errors: &mut Vec<ValidationError>) -> Option<Decimal> {
    let result = parse_required(field, text).and_then(|value| {
        validate_cost(field, value)?;
        Ok(value)
    });
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn check_optional(field: &str, text: &str, errors: &mut Vec<ValidationError>) -> Option<Decimal> {
    if text.trim().is_empty() {
        return Some(Decimal::ZERO);
    }
    match parse_decimal(text) {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(ValidationError::NotANumber {
                field: field.to_string(),
            });
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn form() -> PricingForm {
        PricingForm {
            base_cost: "800".to_string(),
            additional_costs: vec![
                AdditionalCostField::new("Frete", "25"),
                AdditionalCostField::new("Embalagem", "15,00"),
            ],
            ..PricingForm::default()
        }
    }

    #[test]
    fn test_default_form_uses_app_defaults() {
        let form = PricingForm::default();
        assert_eq!(form.margin_value, "25");
        assert_eq!(form.tax_percentage, "18");
        assert_eq!(form.margin_mode, MarginMode::Percentage);
    }

    #[test]
    fn test_preview_matches_example() {
        let result = form().preview(TaxPolicy::OnPreTaxPrice).unwrap();
        assert_eq!(result.final_price.amount(), dec!(1239));
    }

    #[test]
    fn test_preview_treats_garbage_as_zero() {
        let mut form = form();
        form.base_cost = "80o".to_string();
        form.additional_costs[0].value = "-25".to_string();
        form.margin_value = String::new();

        let result = form.preview(TaxPolicy::OnPreTaxPrice).unwrap();
        assert_eq!(result.total_cost.amount(), dec!(15));
        assert!(result.profit_amount.is_zero());
    }

    #[test]
    fn test_preview_surfaces_invalid_tax_rate() {
        let mut form = form();
        form.tax_percentage = "100".to_string();
        assert!(matches!(
            form.preview(TaxPolicy::GrossUp),
            Err(PricingError::InvalidTaxRate { .. })
        ));
        assert!(form.preview(TaxPolicy::OnPreTaxPrice).is_ok());
    }

    #[test]
    fn test_preview_fails_on_negative_tax() {
        let mut form = form();
        form.tax_percentage = "-5".to_string();
        for policy in [TaxPolicy::OnPreTaxPrice, TaxPolicy::GrossUp] {
            assert!(matches!(
                form.preview(policy),
                Err(PricingError::InvalidTaxRate { .. })
            ));
        }
    }

    #[test]
    fn test_validate_returns_terms() {
        let terms = form().validate().unwrap();
        assert_eq!(terms.base_cost.amount(), dec!(800));
        assert_eq!(terms.additional_costs[1].description, "Embalagem");
        assert_eq!(terms.additional_costs[1].value.amount(), dec!(15));
        assert_eq!(terms.margin_value, dec!(25));
        assert_eq!(terms.tax_percentage, dec!(18));
    }

    #[test]
    fn test_validate_collects_every_field_error() {
        let mut form = form();
        form.base_cost = String::new();
        form.additional_costs[0].value = "abc".to_string();
        form.additional_costs[1].value = "-1".to_string();
        form.margin_value = "x".to_string();

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 4);
        assert!(matches!(
            errors.for_field("base_cost"),
            Some(ValidationError::Required { .. })
        ));
        assert!(matches!(
            errors.for_field("additional_costs[0]"),
            Some(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            errors.for_field("additional_costs[1]"),
            Some(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            errors.for_field("margin_value"),
            Some(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_empty_margin_and_tax_mean_zero() {
        let mut form = form();
        form.margin_value = " ".to_string();
        form.tax_percentage = String::new();

        let terms = form.validate().unwrap();
        assert!(terms.margin_value.is_zero());
        assert!(terms.tax_percentage.is_zero());
    }

    #[test]
    fn test_validate_for_checks_policy_bound() {
        let mut form = form();
        form.tax_percentage = "100".to_string();

        assert!(form.validate_for(TaxPolicy::OnPreTaxPrice).is_ok());
        let errors = form.validate_for(TaxPolicy::GrossUp).unwrap_err();
        assert!(matches!(
            errors.for_field("tax_percentage"),
            Some(ValidationError::TaxRateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_policy_bound_reported_with_other_errors() {
        let mut form = form();
        form.base_cost = "abc".to_string();
        form.tax_percentage = "120".to_string();

        let errors = form.validate_for(TaxPolicy::GrossUp).unwrap_err();
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.errors()[1].field(), "tax_percentage");
    }

    #[test]
    fn test_negative_tax_rejected_on_save() {
        let mut form = form();
        form.tax_percentage = "-5".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.for_field("tax_percentage").is_some());
    }
}
