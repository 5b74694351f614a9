//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate is the heart of the back office. It contains all business
//! logic as pure functions and plain types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! External router / SPA client
//!        │
//!        ▼
//! tally-service  (sale, billing, dashboard workflows)
//!        │
//!        ▼
//! tally-core (THIS CRATE)
//!    types • money • pricing • calendar • validation • errors
//!    NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS
//!        │
//!        ▼
//! tally-db  (SQLite queries, migrations, repositories)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ProductLot, Sale, Billing, Employee, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Unit price resolution for sale line items
//! - [`calendar`] - Pure date-window helpers (end-of-day, start-of-month)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input, same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sentinel customer name for anonymous counter sales.
///
/// Credit sales must carry a real customer name; everything else defaults
/// to this value so listings and billing queries have a non-null name to
/// match on.
pub const WALK_IN_CUSTOMER: &str = "walk-in";

/// Lots with quantity strictly below this count as "low stock" on the
/// dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 5;
