//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Preço                                  │
//! │                                                                         │
//! │  Command Function: Result<T, ApiError>                                  │
//! │         │                                                               │
//! │         ├── DbError::NotFound ─────────────┐                            │
//! │         ├── FormErrors (every bad field) ──┤                            │
//! │         ├── PricingError::InvalidTaxRate ──┼──► ApiError { code, msg }  │
//! │         └── no tax policy selected ────────┘          │                 │
//! │                                                       ▼                 │
//! │                          text: "error [NOT_FOUND]: ..." on stderr       │
//! │                          --json: {"code": "NOT_FOUND", ...} on stdout   │
//! │                                       exit code 1                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use preco_core::{CoreError, FormErrors, PricingError};
use preco_db::DbError;

/// Error returned from CLI commands.
///
/// ## Serialization
/// With `--json`, this is what a script receives:
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "base_cost is required",
///   "fields": [{ "field": "base_cost", "message": "base_cost is required" }]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation failures, in form order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// One failing form field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error codes for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or history entry not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// The price cannot be computed (tax rate out of range, overflow)
    PricingError,

    /// No tax policy given by flag or environment
    PolicyRequired,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::PricingError => "PRICING_ERROR",
            ErrorCode::PolicyRequired => "POLICY_REQUIRED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        })
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Raised when neither `--tax-policy` nor `PRECO_TAX_POLICY` is set.
    pub fn policy_required() -> Self {
        ApiError::new(
            ErrorCode::PolicyRequired,
            "No tax policy selected: pass --tax-policy on-pre-tax-price|gross-up or set PRECO_TAX_POLICY",
        )
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid product reference")
            }
            DbError::Decode { field, reason } => {
                tracing::error!(%field, %reason, "Stored value could not be decoded");
                ApiError::new(
                    ErrorCode::DatabaseError,
                    format!("Stored {} value is corrupt", field),
                )
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError::new(ErrorCode::PricingError, err.to_string())
    }
}

impl From<FormErrors> for ApiError {
    fn from(errors: FormErrors) -> Self {
        let fields = errors
            .errors()
            .iter()
            .map(|e| FieldError {
                field: e.field().to_string(),
                message: e.to_string(),
            })
            .collect();

        ApiError {
            code: ErrorCode::ValidationError,
            message: errors.to_string(),
            fields,
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Pricing(e) => e.into(),
            CoreError::Validation(e) => FormErrors::from(e).into(),
            CoreError::Form(e) => e.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use preco_core::{TaxPolicy, ValidationError};
    use rust_decimal_macros::dec;

    #[test]
    fn test_form_errors_keep_every_field() {
        let errors = FormErrors::from_errors(vec![
            ValidationError::Required {
                field: "base_cost".to_string(),
            },
            ValidationError::NotANumber {
                field: "margin_value".to_string(),
            },
        ])
        .unwrap();

        let api: ApiError = errors.into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.fields.len(), 2);
        assert_eq!(api.fields[1].field, "margin_value");
    }

    #[test]
    fn test_invalid_tax_rate_is_pricing_error() {
        let api: ApiError = CoreError::from(PricingError::InvalidTaxRate {
            rate: dec!(100),
            policy: TaxPolicy::GrossUp,
        })
        .into();
        assert_eq!(api.code, ErrorCode::PricingError);
        assert!(api.message.contains("gross-up"));
    }

    #[test]
    fn test_db_not_found_maps_to_not_found() {
        let api: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(api.code, ErrorCode::NotFound);
        assert_eq!(api.to_string(), "[NOT_FOUND] Product not found: p-1");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(ApiError::policy_required()).unwrap();
        assert_eq!(json["code"], "POLICY_REQUIRED");
        assert!(json.get("fields").is_none());
    }
}
