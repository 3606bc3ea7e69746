//! # Validation Module
//!
//! Input validation utilities for Preço.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Live preview (form::PricingForm::preview)                    │
//! │  ├── Unparsable numbers count as 0                                     │
//! │  └── Never blocks the user while typing                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Save (form::PricingForm::validate)                           │
//! │  └── THIS MODULE: field-level rules, every failure collected           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── CHECK constraints on enum columns                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::decimal::parse_decimal;
use crate::error::{ParseError, ValidationError};
use crate::pricing::TaxPolicy;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum product name length.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum additional-cost description length.
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Maximum stored image URI length.
pub const MAX_IMAGE_URI_LEN: usize = 2048;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
///
/// ## Example
/// ```rust
/// use preco_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Camiseta básica").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an additional-cost description. Empty is allowed.
pub fn validate_description(field: &str, description: &str) -> ValidationResult<()> {
    if description.trim().chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

/// Validates a product name search fragment.
///
/// ## Returns
/// The trimmed query string. Empty means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(query.to_string())
}

/// Validates an optional image URI.
pub fn validate_image_uri(uri: Option<&str>) -> ValidationResult<()> {
    match uri {
        Some(uri) if uri.len() > MAX_IMAGE_URI_LEN => Err(ValidationError::TooLong {
            field: "image_uri".to_string(),
            max: MAX_IMAGE_URI_LEN,
        }),
        Some(uri) if uri.trim().is_empty() => Err(ValidationError::InvalidFormat {
            field: "image_uri".to_string(),
            reason: "must not be blank".to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a required numeric field.
///
/// ## Error Mapping
/// ```text
/// ""     → ValidationError::Required
/// "abc"  → ValidationError::NotANumber
/// ```
pub fn parse_required(field: &str, text: &str) -> ValidationResult<Decimal> {
    parse_decimal(text).map_err(|err| match err {
        ParseError::Empty => ValidationError::Required {
            field: field.to_string(),
        },
        ParseError::Invalid { .. } => ValidationError::NotANumber {
            field: field.to_string(),
        },
    })
}

/// Validates a cost amount.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free inputs)
///
/// ## Example
/// ```rust
/// use preco_core::validation::validate_cost;
/// use rust_decimal::Decimal;
///
/// assert!(validate_cost("base_cost", Decimal::from(800)).is_ok());
/// assert!(validate_cost("base_cost", Decimal::ZERO).is_ok());
/// assert!(validate_cost("base_cost", Decimal::from(-1)).is_err());
/// ```
pub fn validate_cost(field: &str, value: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax percentage for a tax policy.
///
/// ## Rules
/// - Must be non-negative
/// - Under gross-up, must be below 100 (the formula divides by `1 - t/100`)
pub fn validate_tax_percentage(rate: Decimal, policy: TaxPolicy) -> ValidationResult<()> {
    if policy.accepts(rate) {
        return Ok(());
    }

    match policy.max_tax_percentage() {
        Some(max) => Err(ValidationError::TaxRateOutOfRange {
            field: "tax_percentage".to_string(),
            max,
        }),
        None => Err(ValidationError::Negative {
            field: "tax_percentage".to_string(),
        }),
    }
}

// =============================================================================
// Id Validators
// =============================================================================

/// Validates a record id given on the command line.
///
/// Returns the id in the lowercase hyphenated form it is stored in, so
/// `{550E8400-...}` and `550e8400e29b...` find the same row.
///
/// ## Example
/// ```rust
/// use preco_core::validation::validate_record_id;
///
/// let id = validate_record_id("id", "550E8400E29B41D4A716446655440000").unwrap();
/// assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
/// assert!(validate_record_id("id", "p-1").is_err());
/// ```
pub fn validate_record_id(field: &str, id: &str) -> ValidationResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a UUID".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Camiseta").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
        // Counted in characters, not bytes
        assert!(validate_product_name(&"ç".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("additional_costs[0].description", "").is_ok());
        assert!(validate_description("additional_costs[0].description", "Frete").is_ok());
        assert!(validate_description("d", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  cafe ").unwrap(), "cafe");
        assert!(validate_search_query(&"q".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_image_uri() {
        assert!(validate_image_uri(None).is_ok());
        assert!(validate_image_uri(Some("file:///photos/1.jpg")).is_ok());
        assert!(validate_image_uri(Some("  ")).is_err());
        assert!(validate_image_uri(Some(&"a".repeat(3000))).is_err());
    }

    #[test]
    fn test_parse_required() {
        assert_eq!(parse_required("base_cost", "12,5").unwrap(), dec!(12.5));
        assert_eq!(
            parse_required("base_cost", "").unwrap_err(),
            ValidationError::Required {
                field: "base_cost".to_string()
            }
        );
        assert_eq!(
            parse_required("base_cost", "doze").unwrap_err(),
            ValidationError::NotANumber {
                field: "base_cost".to_string()
            }
        );
    }

    #[test]
    fn test_validate_cost() {
        assert!(validate_cost("base_cost", dec!(0)).is_ok());
        assert!(validate_cost("base_cost", dec!(10.99)).is_ok());
        assert!(validate_cost("base_cost", dec!(-0.01)).is_err());
    }

    #[test]
    fn test_validate_tax_percentage() {
        assert!(validate_tax_percentage(dec!(18), TaxPolicy::GrossUp).is_ok());
        assert!(validate_tax_percentage(dec!(99.99), TaxPolicy::GrossUp).is_ok());
        assert_eq!(
            validate_tax_percentage(dec!(100), TaxPolicy::GrossUp).unwrap_err(),
            ValidationError::TaxRateOutOfRange {
                field: "tax_percentage".to_string(),
                max: dec!(100)
            }
        );
        assert!(validate_tax_percentage(dec!(150), TaxPolicy::OnPreTaxPrice).is_ok());
        assert!(validate_tax_percentage(dec!(-1), TaxPolicy::OnPreTaxPrice).is_err());
        assert!(validate_tax_percentage(dec!(-1), TaxPolicy::GrossUp).is_err());
    }

    #[test]
    fn test_validate_record_id() {
        assert_eq!(
            validate_record_id("id", " 550e8400-e29b-41d4-a716-446655440000 ").unwrap(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(
            validate_record_id("product", "").unwrap_err(),
            ValidationError::Required {
                field: "product".to_string()
            }
        );
        assert!(matches!(
            validate_record_id("id", "c-1"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }
}
