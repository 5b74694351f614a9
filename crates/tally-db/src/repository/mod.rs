//! # Repository Modules
//!
//! One repository per aggregate. Repositories own their SQL; callers see
//! typed methods returning domain types from `tally-core`.

pub mod billing;
pub mod employee;
pub mod lot;
pub mod sale;

pub use billing::BillingRepository;
pub use employee::EmployeeRepository;
pub use lot::LotRepository;
pub use sale::{CreditLine, SaleFilter, SalePage, SaleRepository, SaleSortField, SortOrder};
