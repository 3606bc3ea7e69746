//! # preco-core: Pure Business Logic for Preço
//!
//! Price calculation for small sellers: what a product costs, what margin
//! to add, and what tax to charge on top. Everything here is a pure
//! function over already-parsed values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Preço Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    preco-cli (apps/preco-cli)                   │   │
//! │  │    calc ──► product add/update/list ──► history list/show       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ preco-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │   form    │  │  decimal  │  │   types   │  │   │
//! │  │   │ compute   │  │ preview   │  │  parse    │  │  Product  │  │   │
//! │  │   │ TaxPolicy │  │ validate  │  │  "1,5"    │  │Calculation│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    preco-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pricing`] - The calculator and the two tax policies
//! - [`form`] - Raw form text → live preview or validated terms
//! - [`decimal`] - Locale-aware text → `Decimal` parsing
//! - [`money`] - Money type over `rust_decimal`
//! - [`types`] - Product and Calculation records
//! - [`validation`] - Field-level rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use preco_core::form::{AdditionalCostField, PricingForm};
//! use preco_core::pricing::TaxPolicy;
//!
//! let form = PricingForm {
//!     base_cost: "800".to_string(),
//!     additional_costs: vec![
//!         AdditionalCostField::new("Frete", "25"),
//!         AdditionalCostField::new("Embalagem", "15"),
//!     ],
//!     ..PricingForm::default()
//! };
//!
//! let additive = form.preview(TaxPolicy::OnPreTaxPrice).unwrap();
//! assert_eq!(additive.final_price.to_string(), "1239.00");
//!
//! let gross_up = form.preview(TaxPolicy::GrossUp).unwrap();
//! assert_eq!(gross_up.final_price.to_string(), "1280.49");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod decimal;
pub mod error;
pub mod form;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, FormErrors, ParseError, PricingError, ValidationError};
pub use form::{AdditionalCostField, PricingForm};
pub use money::Money;
pub use pricing::{compute, MarginMode, PriceCalculator, PricingInput, PricingResult, TaxPolicy};
pub use types::*;
