//! # Error Types
//!
//! Domain-specific error types for garage-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  garage-core errors (this file)                                        │
//! │  ├── CoreError        - Every checkout failure, kind fixed at creation  │
//! │  └── ValidationError  - One field-level input problem                   │
//! │                                                                         │
//! │  garage-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, converted into CoreError     │
//! │                                                                         │
//! │  checkout-api errors                                                   │
//! │  └── ApiError         - HTTP status + JSON envelope                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError                           │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                      kind() → ApiError → HTTP                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, available/required amounts)
//! 3. The category of a failure is decided where it is raised, never
//!    recovered later by reading the message text

use thiserror::Error;
use uuid::Uuid;

use crate::quantity::{Quantity, Volume};

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse category of a [`CoreError`].
///
/// The HTTP layer chooses a status code from this and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input is malformed. Nothing was written.
    Validation,
    /// A stock or bottle invariant would be violated by the request.
    BusinessLogic,
    /// A referenced product, inventory row or location does not exist.
    NotFound,
    /// The database could not be reached.
    ConnectionFailed,
    /// The database rejected our credentials.
    AuthFailed,
    /// The pre-flight probe failed for a reason we could not classify.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Whether the same request may succeed if simply retried later.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectionFailed | ErrorKind::AuthFailed | ErrorKind::Unavailable
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Checkout failures.
///
/// Every variant maps to exactly one [`ErrorKind`] and one machine-readable
/// `errorType` code.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The request body failed schema or field validation.
    #[error("Invalid input data: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A cart line carries a product id that is not a UUID.
    #[error("Invalid product ID format: {0}")]
    InvalidProductId(String),

    /// A cart line names a bottle source other than CLOSED or OPEN.
    #[error("Invalid source '{0}' for lubricant sale, expected CLOSED or OPEN")]
    InvalidSource(String),

    /// The location does not exist. Holds the id as the till sent it.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// No inventory row for the product at the location.
    #[error("Inventory not found for product {product_id} at location {location_id}")]
    InventoryNotFound { product_id: Uuid, location_id: Uuid },

    /// Generic missing row reported by the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The active batch cannot cover the line on its own.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 5 units
    ///      │
    ///      ▼
    /// Active batch B1: 3 remaining
    ///      │
    ///      ▼
    /// InsufficientBatchStock { available: 3, required: 5 }
    ///      │
    ///      ▼
    /// Cashier splits the sale or restocks
    /// ```
    #[error("Insufficient stock in active batch {batch_id}. Available: {available}, Required: {required}")]
    InsufficientBatchStock {
        batch_id: Uuid,
        available: i64,
        required: i64,
    },

    /// Standard (unit) stock cannot cover the line.
    #[error("Insufficient standard stock for product {product_id}. Available: {available}, Required: {required}")]
    InsufficientStandardStock {
        product_id: Uuid,
        available: i64,
        required: i64,
    },

    /// No batch with remaining stock and fabrication is disabled.
    #[error("No batch with remaining stock for inventory {inventory_id}")]
    NoBatchAvailable { inventory_id: Uuid },

    /// A unit-stocked product was sold in a fractional amount.
    #[error("Quantity {quantity} for product {product_id} must be a whole number of units")]
    FractionalQuantity { product_id: Uuid, quantity: Quantity },

    /// CLOSED source requested but there are no sealed bottles.
    #[error("No closed bottles available for product {product_id}")]
    NoClosedBottles { product_id: Uuid },

    /// OPEN source requested but there is no partially used bottle.
    #[error("No open bottles available for product {product_id}")]
    NoOpenBottles { product_id: Uuid },

    /// The oldest open bottle holds less than the line needs.
    #[error("Insufficient volume in open bottle {bottle_id}. Available: {available}, Required: {required}")]
    InsufficientBottleVolume {
        bottle_id: Uuid,
        available: Volume,
        required: Volume,
    },

    /// A line or total does not fit in the money range.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// A database constraint rejected a write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The database could not be reached.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// The database refused authentication.
    #[error("Database authentication failed: {0}")]
    AuthFailed(String),

    /// The pre-flight probe failed.
    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_)
            | CoreError::InvalidProductId(_)
            | CoreError::AmountOutOfRange(_) => ErrorKind::Validation,

            CoreError::InvalidSource(_)
            | CoreError::InsufficientBatchStock { .. }
            | CoreError::InsufficientStandardStock { .. }
            | CoreError::NoBatchAvailable { .. }
            | CoreError::FractionalQuantity { .. }
            | CoreError::NoClosedBottles { .. }
            | CoreError::NoOpenBottles { .. }
            | CoreError::InsufficientBottleVolume { .. }
            | CoreError::ConstraintViolation(_) => ErrorKind::BusinessLogic,

            CoreError::LocationNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::InventoryNotFound { .. }
            | CoreError::NotFound { .. } => ErrorKind::NotFound,

            CoreError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            CoreError::AuthFailed(_) => ErrorKind::AuthFailed,
            CoreError::DatabaseUnavailable(_) => ErrorKind::Unavailable,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable `errorType` sent to clients.
    pub fn error_type(&self) -> &'static str {
        match self {
            CoreError::LocationNotFound(_) => "LOCATION_NOT_FOUND",
            _ => match self.kind() {
                ErrorKind::Validation => "VALIDATION_ERROR",
                ErrorKind::BusinessLogic => "BUSINESS_LOGIC_ERROR",
                ErrorKind::NotFound => "PRODUCT_NOT_FOUND",
                ErrorKind::ConnectionFailed => "CONNECTION_FAILED",
                ErrorKind::AuthFailed => "AUTH_FAILED",
                ErrorKind::Unavailable => "DATABASE_UNAVAILABLE",
                ErrorKind::Internal => "INTERNAL_ERROR",
            },
        }
    }

    /// Recovery guidance shown next to the error.
    pub fn suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Check the request fields and resubmit.",
            ErrorKind::BusinessLogic => {
                "Adjust the quantity or bottle source, or restock before retrying."
            }
            ErrorKind::NotFound => "Refresh the product catalog; the item may have been removed.",
            ErrorKind::ConnectionFailed | ErrorKind::Unavailable => {
                "The database is temporarily unreachable. Retry in a few moments."
            }
            ErrorKind::AuthFailed => "Check the database credentials configured for this service.",
            ErrorKind::Internal => "Contact support with the request id.",
        }
    }

    /// Field-level problems, when this is a validation failure.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            CoreError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request fields don't meet requirements.
/// Every variant names the offending field using the wire path
/// (`cart[2].quantity`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be a whole number.
    #[error("{field} must be a whole number")]
    MustBeWhole { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection exceeds its maximum size.
    #[error("{field} must have at most {max} entries")]
    TooMany { field: String, max: usize },

    /// Value exceeds its upper bound.
    #[error("{field} must not exceed {max}")]
    TooLarge { field: String, max: String },

    /// Body is not the expected JSON shape.
    #[error("{field} is malformed: {reason}")]
    Malformed { field: String, reason: String },
}

impl ValidationError {
    /// The wire path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::MustBeWhole { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::TooMany { field, .. }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::Malformed { field, .. } => field,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(vec![err])
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let batch_id = Uuid::nil();
        let err = CoreError::InsufficientBatchStock {
            batch_id,
            available: 3,
            required: 5,
        };
        assert_eq!(
            err.to_string(),
            format!("Insufficient stock in active batch {batch_id}. Available: 3, Required: 5")
        );
    }

    #[test]
    fn test_kinds_are_fixed_by_variant() {
        assert_eq!(
            CoreError::InvalidProductId("abc".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::InvalidSource("HALF".into()).kind(),
            ErrorKind::BusinessLogic
        );
        assert_eq!(
            CoreError::ConstraintViolation("fk".into()).kind(),
            ErrorKind::BusinessLogic
        );
        assert_eq!(
            CoreError::ProductNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::AuthFailed("password".into()).kind(),
            ErrorKind::AuthFailed
        );
    }

    #[test]
    fn test_error_type_codes() {
        assert_eq!(
            CoreError::LocationNotFound("branch-1".into()).error_type(),
            "LOCATION_NOT_FOUND"
        );
        assert_eq!(
            CoreError::AmountOutOfRange("total".into()).error_type(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            CoreError::InventoryNotFound {
                product_id: Uuid::nil(),
                location_id: Uuid::nil(),
            }
            .error_type(),
            "PRODUCT_NOT_FOUND"
        );
        assert_eq!(
            CoreError::NoOpenBottles {
                product_id: Uuid::nil()
            }
            .error_type(),
            "BUSINESS_LOGIC_ERROR"
        );
        assert_eq!(
            CoreError::Internal("boom".into()).error_type(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "cashierId".to_string(),
        };
        assert_eq!(err.to_string(), "cashierId is required");
        assert_eq!(err.field(), "cashierId");

        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Validation(ref e) if e.len() == 1));
        assert_eq!(core.validation_errors().len(), 1);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::ConnectionFailed.is_retryable());
        assert!(!ErrorKind::BusinessLogic.is_retryable());
    }
}
