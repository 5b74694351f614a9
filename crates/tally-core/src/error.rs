//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! tally-core errors (this file)
//! ├── CoreError        - Business rule violations
//! └── ValidationError  - Input validation failures
//!
//! tally-db errors (separate crate)
//! └── DbError          - Database operation failures
//!
//! tally-service errors
//! └── ServiceError     - What the router sees (serialized)
//!
//! Flow: ValidationError → CoreError → DbError → ServiceError → Router
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, available stock)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations in the sale, billing and
/// inventory workflows. They are surfaced synchronously to the caller and
/// never crash the process.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale was submitted with an empty item list.
    #[error("No items provided")]
    EmptyOrder,

    /// A line item quantity is zero or negative.
    #[error("Quantity must be greater than zero (got {got})")]
    InvalidQuantity { got: i64 },

    /// Not enough stock on the referenced lot to fulfil a line item.
    ///
    /// The message names the product and its available quantity so the
    /// cashier can correct the order.
    #[error("Not enough stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A credit sale was submitted without a real customer name.
    ///
    /// Credit sales are receivables; the sentinel walk-in customer cannot
    /// carry one.
    #[error("Customer name is required for credit sales")]
    MissingCustomer,

    /// Product lot cannot be found.
    #[error("Product lot not found: {0}")]
    LotNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Billing record not found.
    #[error("Billing record not found: {0}")]
    BillingNotFound(String),

    /// A billing generation request matched no credit sales.
    #[error("No unpaid credit sales found for selected customers")]
    NoMatchingSales,

    /// A billing generation request is missing customers or dates.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements and are used for
/// early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. invalid UUID, invalid date range).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. duplicate employee email).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
