//! # Error Types
//!
//! Domain-specific error types for preco-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  preco-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── PricingError     - PriceCalculator failures                       │
//! │  ├── ParseError       - Text → Decimal failures                        │
//! │  ├── ValidationError  - One field-level input failure                  │
//! │  └── FormErrors       - Every failing field of a form                  │
//! │                                                                         │
//! │  preco-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the user sees                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → stderr                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use crate::pricing::TaxPolicy;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The price calculation rejected its input.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A single field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A form failed validation on one or more fields.
    #[error("Validation error: {0}")]
    Form(#[from] FormErrors),
}

// =============================================================================
// Pricing Error
// =============================================================================

/// Errors returned by [`crate::pricing::compute`].
///
/// ## When This Occurs
/// ```text
/// base_cost = -5          → InvalidInput { field: "base_cost", .. }
/// gross-up, tax = 100     → InvalidTaxRate (1 - 100/100 = 0, division by zero)
/// tax = -3                → InvalidTaxRate (under either policy)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// A cost field is negative.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// The tax percentage cannot be applied under the selected policy.
    #[error("Invalid tax rate {rate}% for {policy} policy")]
    InvalidTaxRate { rate: Decimal, policy: TaxPolicy },

    /// An intermediate amount left the representable decimal range.
    #[error("Amount overflow while computing {step}")]
    Overflow { step: &'static str },
}

impl PricingError {
    /// Creates an InvalidInput error for a negative amount.
    pub fn negative(field: impl Into<String>) -> Self {
        PricingError::InvalidInput {
            field: field.into(),
            reason: "must not be negative".to_string(),
        }
    }
}

// =============================================================================
// Parse Error
// =============================================================================

/// Errors returned by [`crate::decimal::parse_decimal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing but whitespace was entered.
    #[error("value is empty")]
    Empty,

    /// The text is not a number in any accepted format.
    #[error("'{input}' is not a number")]
    Invalid { input: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used to block a save until the field is corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field text is not a number.
    #[error("{field} must be a number")]
    NotANumber { field: String },

    /// Amount must be zero or more.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Tax percentage cannot be applied under the chosen policy.
    #[error("{field} must be at least 0 and below {max}")]
    TaxRateOutOfRange { field: String, max: Decimal },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::NotANumber { field }
            | ValidationError::Negative { field }
            | ValidationError::TaxRateOutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Every field-level error found in one pass over a form.
///
/// Never empty when returned as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FormErrors(Vec<ValidationError>);

impl FormErrors {
    /// Wraps the collected errors; `None` when there are none.
    pub fn from_errors(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(FormErrors(errors))
        }
    }

    /// The individual field errors, in form order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Adds one more field error.
    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// Returns the error for a given field, if that field failed.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl From<ValidationError> for FormErrors {
    fn from(err: ValidationError) -> Self {
        FormErrors(vec![err])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
