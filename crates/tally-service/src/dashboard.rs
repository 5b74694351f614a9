//! # Dashboard Rollups
//!
//! The four tiles on the landing screen, computed on read:
//! - today's revenue (paid sales dated today; unpaid credit is a
//!   receivable, not revenue)
//! - this month's profit (paid sales, price minus frozen cost)
//! - lots running low on stock
//! - active employees
//!
//! Nothing is cached or pre-aggregated; all figures come straight from the
//! sale line item snapshots, so a reversal is reflected on the next load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;
use tally_core::{calendar, LOW_STOCK_THRESHOLD};
use tally_db::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Revenue across paid sales dated today, in cents.
    pub sales_today_cents: i64,
    /// Profit across paid sales dated this calendar month, in cents. Can
    /// be negative when goods moved below cost.
    pub profit_month_cents: i64,
    /// Lots with quantity below the low-stock threshold.
    pub low_stock_lots: i64,
    /// Active employee count.
    pub active_employees: i64,
}

/// Dashboard summary queries.
#[derive(Debug, Clone)]
pub struct DashboardService {
    db: Database,
}

impl DashboardService {
    pub fn new(db: Database) -> Self {
        DashboardService { db }
    }

    /// Computes the summary relative to `now` (callers pass `Utc::now()`;
    /// tests pass fixed instants).
    pub async fn summary_at(&self, now: DateTime<Utc>) -> ServiceResult<DashboardSummary> {
        let today = calendar::start_of_today(now);
        let month = calendar::start_of_month(now);

        let sales_today_cents = self.db.sales().revenue_since(today).await?;
        let profit_month_cents = self.db.sales().profit_since(month).await?;
        let low_stock_lots = self.db.lots().count_low_stock(LOW_STOCK_THRESHOLD).await?;
        let active_employees = self.db.employees().count_active().await?;

        Ok(DashboardSummary {
            sales_today_cents,
            profit_month_cents,
            low_stock_lots,
            active_employees,
        })
    }

    /// Computes the summary as of now.
    pub async fn summary(&self) -> ServiceResult<DashboardSummary> {
        self.summary_at(Utc::now()).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::{CreateSaleRequest, SaleLineRequest, SaleService};
    use crate::testutil::{owner, seeded_db, seeded_lot};
    use tally_core::{Buyer, SaleType};

    #[tokio::test]
    async fn test_empty_database_summary() {
        let db = seeded_db().await;
        let dashboard = DashboardService::new(db);

        let summary = dashboard.summary().await.unwrap();
        assert_eq!(summary.sales_today_cents, 0);
        assert_eq!(summary.profit_month_cents, 0);
        assert_eq!(summary.low_stock_lots, 0);
        assert_eq!(summary.active_employees, 0);
    }

    #[tokio::test]
    async fn test_summary_reflects_sales_and_stock() {
        let db = seeded_db().await;
        // 2 on hand after the sale: below the threshold of 5
        let lot = seeded_lot(&db, "A4 Paper", 6, 400, 600, None).await;
        let sales = SaleService::new(db.clone());
        let dashboard = DashboardService::new(db.clone());

        sales
            .record_sale(
                &owner(),
                CreateSaleRequest {
                    sale_type: SaleType::Cash,
                    buyer: Buyer::Customer,
                    customer_name: None,
                    sale_date: None,
                    items: vec![SaleLineRequest {
                        lot_id: lot.id.clone(),
                        quantity: 4,
                        price_cents: None,
                    }],
                },
            )
            .await
            .unwrap();

        let summary = dashboard.summary().await.unwrap();
        assert_eq!(summary.sales_today_cents, 2400); // 4 × 600
        assert_eq!(summary.profit_month_cents, 800); // 4 × (600 − 400)
        assert_eq!(summary.low_stock_lots, 1);
    }

    #[tokio::test]
    async fn test_unpaid_credit_is_not_revenue() {
        let db = seeded_db().await;
        let lot = seeded_lot(&db, "A4 Paper", 10, 400, 600, None).await;
        let sales = SaleService::new(db.clone());
        let dashboard = DashboardService::new(db.clone());

        sales
            .record_sale(
                &owner(),
                CreateSaleRequest {
                    sale_type: SaleType::Credit,
                    buyer: Buyer::Customer,
                    customer_name: Some("Bilal Traders".to_string()),
                    sale_date: None,
                    items: vec![SaleLineRequest {
                        lot_id: lot.id.clone(),
                        quantity: 4,
                        price_cents: None,
                    }],
                },
            )
            .await
            .unwrap();

        let summary = dashboard.summary().await.unwrap();
        assert_eq!(summary.sales_today_cents, 0);
        assert_eq!(summary.profit_month_cents, 0);
    }

    #[tokio::test]
    async fn test_reversal_shows_up_in_rollups() {
        let db = seeded_db().await;
        let lot = seeded_lot(&db, "A4 Paper", 10, 400, 600, None).await;
        let sales = SaleService::new(db.clone());
        let dashboard = DashboardService::new(db.clone());

        let receipt = sales
            .record_sale(
                &owner(),
                CreateSaleRequest {
                    sale_type: SaleType::Cash,
                    buyer: Buyer::Customer,
                    customer_name: None,
                    sale_date: None,
                    items: vec![SaleLineRequest {
                        lot_id: lot.id.clone(),
                        quantity: 4,
                        price_cents: None,
                    }],
                },
            )
            .await
            .unwrap();

        sales.reverse_sale(&receipt.sale_id).await.unwrap();

        let summary = dashboard.summary().await.unwrap();
        assert_eq!(summary.sales_today_cents, 0);
        assert_eq!(summary.profit_month_cents, 0);
    }

    #[tokio::test]
    async fn test_negative_margin_profit() {
        let db = seeded_db().await;
        // Selling below cost
        let lot = seeded_lot(&db, "Clearance Folder", 10, 500, 300, None).await;
        let sales = SaleService::new(db.clone());
        let dashboard = DashboardService::new(db.clone());

        sales
            .record_sale(
                &owner(),
                CreateSaleRequest {
                    sale_type: SaleType::Cash,
                    buyer: Buyer::Customer,
                    customer_name: None,
                    sale_date: None,
                    items: vec![SaleLineRequest {
                        lot_id: lot.id.clone(),
                        quantity: 2,
                        price_cents: None,
                    }],
                },
            )
            .await
            .unwrap();

        let summary = dashboard.summary().await.unwrap();
        assert_eq!(summary.profit_month_cents, -400); // 2 × (300 − 500)
    }
}
