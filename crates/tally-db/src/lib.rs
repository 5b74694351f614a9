//! # tally-db: SQLite Persistence for Tally POS
//!
//! Connection pooling, embedded migrations and repositories over SQLite.
//!
//! ## Architecture Position
//! ```text
//! tally-service  (workflows)
//!        │
//!        ▼
//! tally-db (THIS CRATE)
//!    pool • migrations • repositories
//!        │
//!        ▼
//!     SQLite (WAL mode)
//! ```
//!
//! ## Invariants Enforced Here
//! - Stock decrements are conditional single statements; quantity cannot
//!   go negative, even under concurrent sales.
//! - A sale and its stock movements commit atomically.
//! - Billing settlement cascades onto covered sales in the same
//!   transaction that flips the billing's own status.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    BillingRepository, CreditLine, EmployeeRepository, LotRepository, SaleFilter, SalePage,
    SaleRepository, SaleSortField, SortOrder,
};
