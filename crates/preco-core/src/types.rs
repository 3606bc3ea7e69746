//! # Domain Types
//!
//! Records persisted by Preço.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐         ┌─────────────────┐                        │
//! │  │    Product      │         │   Calculation   │                        │
//! │  │  ─────────────  │  1 : N  │  ─────────────  │                        │
//! │  │  id (UUID)      │◄────────│  product_id?    │                        │
//! │  │  name           │         │  product_name   │                        │
//! │  │  terms          │         │  terms          │ snapshot, immutable    │
//! │  │  tax_policy     │         │  tax_policy     │                        │
//! │  │  pricing        │         │  pricing        │                        │
//! │  └─────────────────┘         └─────────────────┘                        │
//! │           │                            │                                │
//! │           └──────────┬─────────────────┘                                │
//! │                      ▼                                                  │
//! │            ┌──────────────────┐      ┌────────────────┐                 │
//! │            │  PricingTerms    │─────►│ AdditionalCost │ 0..N            │
//! │            │  base_cost       │      │ description    │                 │
//! │            │  margin_mode     │      │ value          │                 │
//! │            │  margin_value    │      └────────────────┘                 │
//! │            │  tax_percentage  │                                         │
//! │            └──────────────────┘                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids and timestamps are passed in by the caller; nothing here reads the
//! clock or a random source.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::PricingError;
use crate::money::Money;
use crate::pricing::{compute, MarginMode, PricingInput, PricingResult, TaxPolicy};

// =============================================================================
// Additional Cost
// =============================================================================

/// An itemized extra cost (freight, packaging, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdditionalCost {
    /// Free-text label; may be empty.
    #[serde(default)]
    pub description: String,
    pub value: Money,
}

impl AdditionalCost {
    pub fn new(description: impl Into<String>, value: Money) -> Self {
        AdditionalCost {
            description: description.into(),
            value,
        }
    }
}

// =============================================================================
// Pricing Terms
// =============================================================================

/// The user-entered side of a price: what a product or a history entry
/// was priced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingTerms {
    pub base_cost: Money,
    pub additional_costs: Vec<AdditionalCost>,
    pub margin_mode: MarginMode,
    #[ts(type = "string")]
    pub margin_value: Decimal,
    #[ts(type = "string")]
    pub tax_percentage: Decimal,
}

impl PricingTerms {
    /// Drops the descriptions and returns the calculator input.
    pub fn to_input(&self) -> PricingInput {
        PricingInput {
            base_cost: self.base_cost,
            additional_costs: self.additional_costs.iter().map(|c| c.value).collect(),
            margin_mode: self.margin_mode,
            margin_value: self.margin_value,
            tax_percentage: self.tax_percentage,
        }
    }

    /// Sum of the additional cost values.
    pub fn additional_total(&self) -> Money {
        self.additional_costs.iter().map(|c| c.value).sum()
    }

    /// Prices these terms under `policy`.
    pub fn price(&self, policy: TaxPolicy) -> Result<PricingResult, PricingError> {
        compute(&self.to_input(), policy)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A saved product with its current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// What the price was computed from.
    #[serde(flatten)]
    pub terms: PricingTerms,

    /// Tax policy this product is priced under.
    pub tax_policy: TaxPolicy,

    /// Optional picture reference chosen by the user (URI only).
    pub image_uri: Option<String>,

    /// Result snapshot for `terms` under `tax_policy`.
    pub pricing: PricingResult,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product, pricing `terms` under `policy`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        terms: PricingTerms,
        tax_policy: TaxPolicy,
        image_uri: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, PricingError> {
        let pricing = terms.price(tax_policy)?;
        Ok(Product {
            id: id.into(),
            name: name.into().trim().to_string(),
            terms,
            tax_policy,
            image_uri,
            pricing,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the pricing terms (and optionally the policy) and reprices.
    ///
    /// On error the product is left unchanged.
    pub fn reprice(
        &mut self,
        terms: PricingTerms,
        tax_policy: TaxPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        let pricing = terms.price(tax_policy)?;
        self.terms = terms;
        self.tax_policy = tax_policy;
        self.pricing = pricing;
        self.updated_at = now;
        Ok(())
    }

    /// Renames the product.
    pub fn rename(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        self.name = name.into().trim().to_string();
        self.updated_at = now;
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// One entry of the calculation history.
///
/// Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Calculation {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product this calculation was recorded for, if any.
    pub product_id: Option<String>,

    /// Product name at the time of the calculation.
    pub product_name: String,

    #[serde(flatten)]
    pub terms: PricingTerms,

    pub tax_policy: TaxPolicy,

    pub pricing: PricingResult,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Calculation {
    /// Snapshots a product's current terms and price.
    pub fn for_product(id: impl Into<String>, product: &Product, now: DateTime<Utc>) -> Self {
        Calculation {
            id: id.into(),
            product_id: Some(product.id.clone()),
            product_name: product.name.clone(),
            terms: product.terms.clone(),
            tax_policy: product.tax_policy,
            pricing: product.pricing,
            created_at: now,
        }
    }

    /// Prices `terms` and records the result without a product.
    pub fn standalone(
        id: impl Into<String>,
        product_name: impl Into<String>,
        terms: PricingTerms,
        tax_policy: TaxPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, PricingError> {
        let pricing = terms.price(tax_policy)?;
        Ok(Calculation {
            id: id.into(),
            product_id: None,
            product_name: product_name.into().trim().to_string(),
            terms,
            tax_policy,
            pricing,
            created_at: now,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn terms() -> PricingTerms {
        PricingTerms {
            base_cost: Money::new(dec!(800)),
            additional_costs: vec![
                AdditionalCost::new("Frete", Money::new(dec!(25))),
                AdditionalCost::new("Embalagem", Money::new(dec!(15))),
            ],
            margin_mode: MarginMode::Percentage,
            margin_value: dec!(25),
            tax_percentage: dec!(18),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_terms_to_input_keeps_order() {
        let input = terms().to_input();
        assert_eq!(
            input.additional_costs,
            vec![Money::new(dec!(25)), Money::new(dec!(15))]
        );
        assert_eq!(terms().additional_total().amount(), dec!(40));
    }

    #[test]
    fn test_new_product_is_priced() {
        let product = Product::new(
            "p-1",
            "  Cadeira  ",
            terms(),
            TaxPolicy::OnPreTaxPrice,
            None,
            at(1_700_000_000),
        )
        .unwrap();

        assert_eq!(product.name, "Cadeira");
        assert_eq!(product.pricing.final_price.amount(), dec!(1239));
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_new_product_rejects_invalid_tax() {
        let mut bad = terms();
        bad.tax_percentage = dec!(100);
        let err = Product::new("p-1", "Cadeira", bad, TaxPolicy::GrossUp, None, at(0));
        assert!(matches!(err, Err(PricingError::InvalidTaxRate { .. })));
    }

    #[test]
    fn test_reprice_switches_policy() {
        let mut product =
            Product::new("p-1", "Cadeira", terms(), TaxPolicy::OnPreTaxPrice, None, at(0)).unwrap();

        product.reprice(terms(), TaxPolicy::GrossUp, at(60)).unwrap();

        assert_eq!(product.tax_policy, TaxPolicy::GrossUp);
        assert_eq!(product.pricing.final_price.round_cents().amount(), dec!(1280.49));
        assert_eq!(product.updated_at, at(60));
        assert_eq!(product.created_at, at(0));
    }

    #[test]
    fn test_failed_reprice_leaves_product_unchanged() {
        let mut product =
            Product::new("p-1", "Cadeira", terms(), TaxPolicy::GrossUp, None, at(0)).unwrap();
        let before = product.clone();

        let mut bad = terms();
        bad.tax_percentage = dec!(120);
        assert!(product.reprice(bad, TaxPolicy::GrossUp, at(60)).is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn test_calculation_snapshots_product() {
        let product =
            Product::new("p-1", "Cadeira", terms(), TaxPolicy::OnPreTaxPrice, None, at(0)).unwrap();
        let calc = Calculation::for_product("c-1", &product, at(5));

        assert_eq!(calc.product_id.as_deref(), Some("p-1"));
        assert_eq!(calc.product_name, "Cadeira");
        assert_eq!(calc.pricing, product.pricing);
        assert_eq!(calc.terms, product.terms);
    }

    #[test]
    fn test_standalone_calculation() {
        let calc =
            Calculation::standalone("c-1", "Orçamento", terms(), TaxPolicy::GrossUp, at(0)).unwrap();
        assert!(calc.product_id.is_none());
        assert_eq!(calc.pricing.price_before_tax.amount(), dec!(1050));
    }

    #[test]
    fn test_product_json_is_flat() {
        let product =
            Product::new("p-1", "Cadeira", terms(), TaxPolicy::OnPreTaxPrice, None, at(0)).unwrap();
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["base_cost"], "800");
        assert_eq!(json["tax_policy"], "on_pre_tax_price");
        assert_eq!(json["additional_costs"][0]["description"], "Frete");
        let final_price: Decimal = json["pricing"]["final_price"].as_str().unwrap().parse().unwrap();
        assert_eq!(final_price, dec!(1239));

        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back, product);
    }
}
