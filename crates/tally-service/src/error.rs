//! # Service Error Type
//!
//! Unified error type for the back-office operations layer.
//!
//! ## Error Handling Strategy
//! ```text
//! Router / SPA client              Rust backend
//! ───────────────────              ────────────
//!
//! POST /sales
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  Service method                                      │
//! │  Result<T, ServiceError>                             │
//! │         │                                            │
//! │  DbError::StockConflict ──┐                          │
//! │         │                 ▼                          │
//! │  CoreError::Missing… ── ServiceError ───────────────►│
//! │         │                                            │
//! │  Success ───────────────────────────────────────────►│
//! └──────────────────────────────────────────────────────┘
//!
//! { "code": "INSUFFICIENT_STOCK",
//!   "message": "Not enough stock for A4 Paper: available 3, requested 5" }
//! ```
//!
//! The router serializes this as-is; `code` drives client branching and
//! `message` is shown to the cashier verbatim.

use serde::Serialize;
use tally_core::CoreError;
use tally_db::DbError;

/// Error returned from service methods, ready for the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Business rule violation (422)
    BusinessLogic,

    /// Not enough stock to fulfil a line item
    InsufficientStock,

    /// Caller lacks the required role (403)
    Forbidden,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::EmptyOrder
            | CoreError::InvalidQuantity { .. }
            | CoreError::MissingCustomer
            | CoreError::InvalidRequest(_) => {
                ServiceError::new(ErrorCode::ValidationError, err.to_string())
            }

            CoreError::InsufficientStock { .. } => {
                ServiceError::new(ErrorCode::InsufficientStock, err.to_string())
            }

            CoreError::LotNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::BillingNotFound(_) => {
                ServiceError::new(ErrorCode::NotFound, err.to_string())
            }

            CoreError::NoMatchingSales => {
                ServiceError::new(ErrorCode::BusinessLogic, err.to_string())
            }

            CoreError::Validation(_) => ServiceError::validation(err.to_string()),
        }
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),

            DbError::StockConflict { lot_id, available } => ServiceError::new(
                ErrorCode::InsufficientStock,
                format!("Not enough stock on lot {}: {} on hand", lot_id, available),
            ),

            DbError::UniqueViolation { field, value } => ServiceError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),

            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::new(ErrorCode::ValidationError, "Invalid reference")
            }

            DbError::ConnectionFailed(_) => {
                ServiceError::new(ErrorCode::DatabaseError, "Database connection failed")
            }

            DbError::MigrationFailed(_) => {
                ServiceError::new(ErrorCode::DatabaseError, "Database migration failed")
            }

            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }

            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }

            DbError::PoolExhausted => {
                ServiceError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }

            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_errors_share_a_code() {
        let from_core: ServiceError = CoreError::InsufficientStock {
            product: "A4 Paper".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert_eq!(from_core.code, ErrorCode::InsufficientStock);

        let from_db: ServiceError = DbError::StockConflict {
            lot_id: "lot-1".to_string(),
            available: 3,
        }
        .into();
        assert_eq!(from_db.code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let err = ServiceError::validation("Quantity must be greater than zero (got 0)");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"VALIDATION_ERROR\""));
    }
}
