//! # Billing Workflows
//!
//! Generating bills from credit sales and settling them.
//!
//! ## Generation
//! A billing is a derived aggregate over credit sales: pick customers and
//! a date range, and every matching credit-sale line item is snapshotted
//! into the bill. By default only unpaid credit sales are aggregated, so
//! regenerating a bill after settlement finds nothing; callers can opt
//! into including already-paid sales for a statement-style printout.
//!
//! ## Settlement
//! Marking a billing paid settles every sale it covers in the same
//! transaction (status `paid`, sale type `cash`). Flipping back to unpaid
//! does NOT cascade; the sales stay settled and only the bill's own flag
//! changes.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use tally_core::{calendar, Billing, BillingLine, CoreError, PaymentStatus};
use tally_db::repository::billing::{generate_billing_id, generate_billing_line_id};
use tally_db::{Database, DbError};

// =============================================================================
// Request / Response DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBillingRequest {
    /// Customers whose credit sales are aggregated.
    pub customers: Vec<String>,
    pub start_date: NaiveDate,
    /// Inclusive: sales anywhere on this calendar day are covered.
    pub end_date: NaiveDate,
    /// Also include credit sales that are already paid (statement mode).
    /// Default: unpaid only.
    #[serde(default)]
    pub include_paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDetail {
    pub billing: Billing,
    pub lines: Vec<BillingLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub billing: Billing,
    /// Number of covered sales flipped to paid/cash. Zero when flipping to
    /// unpaid, or when the covered sales were deleted since generation.
    pub settled_sales: u64,
}

// =============================================================================
// Service
// =============================================================================

/// Billing generation and settlement.
#[derive(Debug, Clone)]
pub struct BillingService {
    db: Database,
}

impl BillingService {
    pub fn new(db: Database) -> Self {
        BillingService { db }
    }

    /// Generates a billing record from matching credit sales.
    pub async fn generate(&self, req: GenerateBillingRequest) -> ServiceResult<BillingDetail> {
        let customers: Vec<String> = req
            .customers
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if customers.is_empty() {
            return Err(
                CoreError::InvalidRequest("at least one customer is required".to_string()).into(),
            );
        }
        if req.start_date > req.end_date {
            return Err(
                CoreError::InvalidRequest("start date is after end date".to_string()).into(),
            );
        }

        let statuses: &[PaymentStatus] = if req.include_paid {
            &[PaymentStatus::Unpaid, PaymentStatus::Paid]
        } else {
            &[PaymentStatus::Unpaid]
        };

        let from = calendar::start_of_day(req.start_date);
        let until = calendar::end_of_day(req.end_date);

        let credit_lines = self
            .db
            .sales()
            .credit_lines(&customers, from, until, statuses)
            .await?;

        if credit_lines.is_empty() {
            return Err(CoreError::NoMatchingSales.into());
        }

        let billing_id = generate_billing_id();
        let total: i64 = credit_lines
            .iter()
            .map(|l| l.sold_price_cents * l.quantity)
            .sum();

        let billing = Billing {
            id: billing_id.clone(),
            buyer: customers.join(", "),
            start_date: req.start_date,
            end_date: req.end_date,
            total_cents: total,
            status: PaymentStatus::Unpaid,
            generated_at: Utc::now(),
        };

        let lines: Vec<BillingLine> = credit_lines
            .into_iter()
            .map(|l| BillingLine {
                id: generate_billing_line_id(),
                billing_id: billing_id.clone(),
                sale_id: l.sale_id,
                customer_name: l.customer_name,
                product_name: l.product_name,
                quantity: l.quantity,
                sold_price_cents: l.sold_price_cents,
                sale_date: l.sale_date,
            })
            .collect();

        self.db.billings().create(&billing, &lines).await?;

        info!(
            billing_id = %billing.id,
            buyer = %billing.buyer,
            total = %billing.total_cents,
            lines = lines.len(),
            "Billing generated"
        );

        Ok(BillingDetail { billing, lines })
    }

    /// Lists all billing records, newest first.
    pub async fn list(&self) -> ServiceResult<Vec<Billing>> {
        Ok(self.db.billings().list().await?)
    }

    /// Gets a billing with its lines.
    pub async fn get(&self, billing_id: &str) -> ServiceResult<BillingDetail> {
        let billing = self
            .db
            .billings()
            .get_by_id(billing_id)
            .await?
            .ok_or_else(|| CoreError::BillingNotFound(billing_id.to_string()))
            .map_err(ServiceError::from)?;
        let lines = self.db.billings().get_lines(billing_id).await?;
        Ok(BillingDetail { billing, lines })
    }

    /// Sets a billing's status. Paid settles the covered sales; unpaid only
    /// flips the bill's own flag.
    pub async fn set_status(
        &self,
        billing_id: &str,
        status: PaymentStatus,
    ) -> ServiceResult<SettlementReport> {
        let (billing, settled) = match self.db.billings().set_status(billing_id, status).await {
            Ok(result) => result,
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::BillingNotFound(billing_id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            billing_id = %billing_id,
            ?status,
            settled_sales = settled,
            "Billing status updated"
        );

        Ok(SettlementReport {
            billing,
            settled_sales: settled,
        })
    }

    /// Toggles a billing's status (paid ↔ unpaid).
    pub async fn toggle_status(&self, billing_id: &str) -> ServiceResult<SettlementReport> {
        let billing = self
            .db
            .billings()
            .get_by_id(billing_id)
            .await?
            .ok_or_else(|| CoreError::BillingNotFound(billing_id.to_string()))
            .map_err(ServiceError::from)?;

        self.set_status(billing_id, billing.status.toggled()).await
    }

    /// Deletes a billing record. Covered sales keep their current status.
    pub async fn delete(&self, billing_id: &str) -> ServiceResult<()> {
        match self.db.billings().delete(billing_id).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound { .. }) => {
                Err(CoreError::BillingNotFound(billing_id.to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Customers who currently hold unpaid credit sales (billing form
    /// dropdown).
    pub async fn unpaid_credit_customers(&self) -> ServiceResult<Vec<String>> {
        Ok(self.db.sales().unpaid_credit_customers().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
