//! # tally-service: Back-Office Operations for Tally POS
//!
//! The workflow layer an external HTTP router consumes. Each service wraps
//! the shared [`Database`](tally_db::Database) handle and exposes typed
//! request/response DTOs that serialize to camelCase JSON.
//!
//! ## Architecture Position
//! ```text
//! External router / SPA client
//!        │  JSON (camelCase DTOs, { code, message } errors)
//!        ▼
//! tally-service (THIS CRATE)
//!    sale • billing • dashboard • inventory • staff
//!        │
//!        ▼
//! tally-core (pure logic)      tally-db (SQLite)
//! ```
//!
//! ## Services
//! - [`sale::SaleService`] - record, reverse and list sales
//! - [`billing::BillingService`] - generate and settle credit bills
//! - [`dashboard::DashboardService`] - landing-screen rollups
//! - [`inventory::InventoryService`] - purchase entry and lot management
//! - [`staff::StaffService`] - employee roster and owner guard

pub mod billing;
pub mod dashboard;
pub mod error;
pub mod inventory;
pub mod sale;
pub mod staff;

pub use billing::{BillingDetail, BillingService, GenerateBillingRequest, SettlementReport};
pub use dashboard::{DashboardService, DashboardSummary};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use inventory::{CreateLotRequest, InventoryService};
pub use sale::{
    CreateSaleRequest, ReversalReport, SaleLineRequest, SaleListPage, SaleListQuery, SaleReceipt,
    SaleService, SaleWithItems,
};
pub use staff::{RegisterEmployeeRequest, StaffService};

// =============================================================================
// Test Utilities
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::Utc;
    use tally_core::{Principal, ProductLot, Role};
    use tally_db::repository::lot::generate_lot_id;
    use tally_db::{Database, DbConfig};

    pub async fn seeded_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn owner() -> Principal {
        Principal {
            id: "emp-owner".to_string(),
            name: "Imran Malik".to_string(),
            role: Role::Owner,
        }
    }

    pub fn employee_principal() -> Principal {
        Principal {
            id: "emp-1".to_string(),
            name: "Asha Khan".to_string(),
            role: Role::Employee,
        }
    }

    pub async fn seeded_lot(
        db: &Database,
        name: &str,
        quantity: i64,
        cost_cents: i64,
        customer_cents: i64,
        wholesale_cents: Option<i64>,
    ) -> ProductLot {
        let now = Utc::now();
        let lot = ProductLot {
            id: generate_lot_id(),
            product_name: name.to_string(),
            quantity,
            purchase_price_cents: cost_cents,
            customer_price_cents: customer_cents,
            wholesale_price_cents: wholesale_cents,
            supplier: None,
            purchase_date: now,
            created_at: now,
            updated_at: now,
        };
        db.lots().insert(&lot).await.unwrap();
        lot
    }
}
