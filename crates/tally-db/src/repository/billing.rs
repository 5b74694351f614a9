//! # Billing Repository
//!
//! Database operations for billing records and the settlement cascade.
//!
//! ## Settlement Cascade
//! Marking a billing paid also settles every credit sale it covers: the
//! referenced sales flip to `paid` and their sale type flips to `cash`, so
//! they stop matching future credit aggregations. The cascade and the
//! billing's own status flip happen in one transaction, cascade first.
//!
//! The reverse direction does not cascade: flipping a billing back to
//! unpaid leaves the sales as they are.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::{Billing, BillingLine, PaymentStatus, SaleType};

const BILLING_COLUMNS: &str =
    "id, buyer, start_date, end_date, total_cents, status, generated_at";

const LINE_COLUMNS: &str = "id, billing_id, sale_id, customer_name, product_name, \
     quantity, sold_price_cents, sale_date";

/// Repository for billing database operations.
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: SqlitePool,
}

impl BillingRepository {
    /// Creates a new BillingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillingRepository { pool }
    }

    /// Inserts a billing record with its lines in one transaction.
    pub async fn create(&self, billing: &Billing, lines: &[BillingLine]) -> DbResult<()> {
        debug!(id = %billing.id, lines = lines.len(), "Inserting billing");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO billings (
                id, buyer, start_date, end_date, total_cents, status, generated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&billing.id)
        .bind(&billing.buyer)
        .bind(billing.start_date)
        .bind(billing.end_date)
        .bind(billing.total_cents)
        .bind(billing.status)
        .bind(billing.generated_at)
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO billing_lines (
                    id, billing_id, sale_id, customer_name, product_name,
                    quantity, sold_price_cents, sale_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&line.id)
            .bind(&line.billing_id)
            .bind(&line.sale_id)
            .bind(&line.customer_name)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.sold_price_cents)
            .bind(line.sale_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a billing record by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Billing>> {
        let billing = sqlx::query_as::<_, Billing>(&format!(
            "SELECT {BILLING_COLUMNS} FROM billings WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(billing)
    }

    /// Gets the lines of a billing, grouped the way they print.
    pub async fn get_lines(&self, billing_id: &str) -> DbResult<Vec<BillingLine>> {
        let lines = sqlx::query_as::<_, BillingLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM billing_lines \
             WHERE billing_id = ?1 ORDER BY customer_name, sale_date, id"
        ))
        .bind(billing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists all billing records, newest first.
    pub async fn list(&self) -> DbResult<Vec<Billing>> {
        let billings = sqlx::query_as::<_, Billing>(&format!(
            "SELECT {BILLING_COLUMNS} FROM billings ORDER BY generated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(billings)
    }

    /// Deletes a billing record. Lines go with it via `ON DELETE CASCADE`;
    /// the covered sales are untouched.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting billing");

        let result = sqlx::query("DELETE FROM billings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Billing", id));
        }

        Ok(())
    }

    /// Sets a billing's payment status.
    ///
    /// When the new status is `Paid`, every sale the billing covers is
    /// settled first (status `paid`, sale type `cash`) inside the same
    /// transaction. Sales deleted since generation are skipped silently.
    ///
    /// Returns the updated billing and the number of sales settled.
    pub async fn set_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> DbResult<(Billing, u64)> {
        debug!(id = %id, ?status, "Updating billing status");

        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now();
        let mut settled: u64 = 0;

        if status == PaymentStatus::Paid {
            let sale_ids: Vec<String> = sqlx::query_scalar(
                "SELECT DISTINCT sale_id FROM billing_lines WHERE billing_id = ?1",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            if !sale_ids.is_empty() {
                let mut qb: QueryBuilder<Sqlite> =
                    QueryBuilder::new("UPDATE sales SET status = ");
                qb.push_bind(PaymentStatus::Paid);
                qb.push(", sale_type = ").push_bind(SaleType::Cash);
                qb.push(", updated_at = ").push_bind(now);
                qb.push(" WHERE id IN (");
                let mut separated = qb.separated(", ");
                for sale_id in &sale_ids {
                    separated.push_bind(sale_id);
                }
                separated.push_unseparated(")");

                let result = qb.build().execute(&mut *tx).await?;
                settled = result.rows_affected();
            }
        }

        let result = sqlx::query("UPDATE billings SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Billing", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let billing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Billing", id))?;

        Ok((billing, settled))
    }
}

/// Helper to generate a new billing ID.
pub fn generate_billing_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new billing line ID.
pub fn generate_billing_line_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
