//! # Sale Repository
//!
//! Database operations for sales, their line items, and the read-side
//! queries built on them (listing, credit lines, dashboard scalars).
//!
//! ## All-or-Nothing Commit
//! A sale and its stock decrements are written in one transaction. If any
//! line item cannot be filled, the transaction rolls back and no stock
//! moves, no header row appears, no partial line items survive.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::lot::{try_decrement, try_increment};
use tally_core::{Buyer, PaymentStatus, Sale, SaleItem, SaleType};

const SALE_COLUMNS: &str = "id, salesperson, sale_type, buyer, customer_name, \
     status, sale_date, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, sale_id, lot_id, name_snapshot, quantity, \
     sold_price_cents, cost_price_cents, created_at";

// =============================================================================
// Listing Parameters
// =============================================================================

/// Whitelisted sort columns for sale listings.
///
/// Sort input never reaches SQL as a raw string; it is parsed into this
/// enum and mapped to a fixed column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaleSortField {
    #[default]
    SaleDate,
    CustomerName,
    SaleType,
    Status,
}

impl SaleSortField {
    fn column(&self) -> &'static str {
        match self {
            SaleSortField::SaleDate => "sale_date",
            SaleSortField::CustomerName => "customer_name",
            SaleSortField::SaleType => "sale_type",
            SaleSortField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter, sort and pagination parameters for sale listings.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub sale_type: Option<SaleType>,
    pub status: Option<PaymentStatus>,
    pub buyer: Option<Buyer>,
    /// Exact match on customer name.
    pub customer_name: Option<String>,
    /// Substring match against any line item's product name snapshot.
    pub product_name: Option<String>,
    /// Inclusive lower bound on sale_date.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on sale_date.
    pub until: Option<DateTime<Utc>>,
    pub sort: SaleSortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl SaleFilter {
    pub fn new() -> Self {
        SaleFilter {
            limit: 50,
            ..Default::default()
        }
    }

    fn push_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(sale_type) = self.sale_type {
            qb.push(" AND sale_type = ").push_bind(sale_type);
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(buyer) = self.buyer {
            qb.push(" AND buyer = ").push_bind(buyer);
        }
        if let Some(name) = &self.customer_name {
            qb.push(" AND customer_name = ").push_bind(name);
        }
        if let Some(product) = &self.product_name {
            qb.push(
                " AND EXISTS (SELECT 1 FROM sale_items i \
                 WHERE i.sale_id = sales.id AND i.name_snapshot LIKE ",
            )
            .push_bind(format!("%{product}%"))
            .push(")");
        }
        if let Some(from) = self.from {
            qb.push(" AND sale_date >= ").push_bind(from);
        }
        if let Some(until) = self.until {
            qb.push(" AND sale_date <= ").push_bind(until);
        }
    }
}

/// One page of a sale listing plus the unfiltered-by-pagination total.
#[derive(Debug, Clone)]
pub struct SalePage {
    pub sales: Vec<Sale>,
    pub total: i64,
}

// =============================================================================
// Credit Line Read Model
// =============================================================================

/// One credit-sale line item as read back for billing aggregation.
///
/// This is a JOIN projection of `sales` and `sale_items`, not a stored row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreditLine {
    pub sale_id: String,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub sold_price_cents: i64,
    pub sale_date: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Commits a sale: decrements stock for every line item and inserts the
    /// header plus line items, all inside a single transaction.
    ///
    /// ## Errors
    /// - `StockConflict` if any lot's conditional decrement misses; nothing
    ///   is persisted in that case.
    pub async fn create_with_stock(&self, sale: &Sale, items: &[SaleItem]) -> DbResult<()> {
        debug!(id = %sale.id, items = items.len(), "Committing sale");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for item in items {
            let decremented = try_decrement(&mut *tx, &item.lot_id, item.quantity, now).await?;
            if !decremented {
                let available: i64 =
                    sqlx::query_scalar("SELECT quantity FROM lots WHERE id = ?1")
                        .bind(&item.lot_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .unwrap_or(0);
                // Dropping the transaction rolls back earlier decrements.
                return Err(DbError::StockConflict {
                    lot_id: item.lot_id.clone(),
                    available,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, salesperson, sale_type, buyer, customer_name,
                status, sale_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.salesperson)
        .bind(sale.sale_type)
        .bind(sale.buyer)
        .bind(&sale.customer_name)
        .bind(sale.status)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, lot_id, name_snapshot, quantity,
                    sold_price_cents, cost_price_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.lot_id)
            .bind(&item.name_snapshot)
            .bind(item.quantity)
            .bind(item.sold_price_cents)
            .bind(item.cost_price_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a sale header by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all line items of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales matching the filter, with pagination and a total count.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<SalePage> {
        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM sales");
        filter.push_conditions(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
        filter.push_conditions(&mut qb);
        qb.push(format!(
            " ORDER BY {} {}",
            filter.sort.column(),
            filter.order.keyword()
        ));
        qb.push(" LIMIT ").push_bind(filter.limit);
        qb.push(" OFFSET ").push_bind(filter.offset);

        let sales = qb
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;

        Ok(SalePage { sales, total })
    }

    /// Reverses a sale: restores stock per line item (best-effort, skipping
    /// lots that were deleted since) and then removes the sale. Line items
    /// go with it via `ON DELETE CASCADE`.
    ///
    /// Returns the lot IDs whose stock could not be restored.
    pub async fn delete_with_restock(&self, id: &str) -> DbResult<Vec<String>> {
        debug!(id = %id, "Reversing sale");

        let items = self.get_items(id).await?;
        if items.is_empty() && self.get_by_id(id).await?.is_none() {
            return Err(DbError::not_found("Sale", id));
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut missing_lots = Vec::new();

        for item in &items {
            let restored = try_increment(&mut *tx, &item.lot_id, item.quantity, now).await?;
            if !restored {
                missing_lots.push(item.lot_id.clone());
            }
        }

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(missing_lots)
    }

    /// Reads credit-sale line items for the given customers within a
    /// date-time window, restricted to the given payment statuses.
    ///
    /// Rows come back ordered by customer then sale date so billing lines
    /// group naturally on the printed bill.
    pub async fn credit_lines(
        &self,
        customers: &[String],
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        statuses: &[PaymentStatus],
    ) -> DbResult<Vec<CreditLine>> {
        if customers.is_empty() || statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT s.id AS sale_id, s.customer_name, i.name_snapshot AS product_name, \
             i.quantity, i.sold_price_cents, s.sale_date \
             FROM sales s JOIN sale_items i ON i.sale_id = s.id \
             WHERE s.sale_type = ",
        );
        qb.push_bind(SaleType::Credit);

        qb.push(" AND s.customer_name IN (");
        let mut separated = qb.separated(", ");
        for customer in customers {
            separated.push_bind(customer);
        }
        separated.push_unseparated(")");

        qb.push(" AND s.status IN (");
        let mut separated = qb.separated(", ");
        for status in statuses {
            separated.push_bind(*status);
        }
        separated.push_unseparated(")");

        qb.push(" AND s.sale_date >= ").push_bind(from);
        qb.push(" AND s.sale_date <= ").push_bind(until);
        qb.push(" ORDER BY s.customer_name, s.sale_date, i.created_at");

        let lines = qb
            .build_query_as::<CreditLine>()
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Distinct customer names that currently hold unpaid credit sales.
    pub async fn unpaid_credit_customers(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT customer_name FROM sales \
             WHERE sale_type = ?1 AND status = ?2 ORDER BY customer_name",
        )
        .bind(SaleType::Credit)
        .bind(PaymentStatus::Unpaid)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    // =========================================================================
    // Dashboard Scalars
    // =========================================================================

    /// Total revenue (price × quantity) across paid sales dated at or
    /// after `since`. Unpaid credit sales are receivables, not revenue.
    pub async fn revenue_since(&self, since: DateTime<Utc>) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(i.sold_price_cents * i.quantity) \
             FROM sale_items i JOIN sales s ON s.id = i.sale_id \
             WHERE s.sale_date >= ?1 AND s.status = ?2",
        )
        .bind(since)
        .bind(PaymentStatus::Paid)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Total profit ((price − cost) × quantity) across paid sales dated at
    /// or after `since`. Negative when goods moved below cost.
    pub async fn profit_since(&self, since: DateTime<Utc>) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM((i.sold_price_cents - i.cost_price_cents) * i.quantity) \
             FROM sale_items i JOIN sales s ON s.id = i.sale_id \
             WHERE s.sale_date >= ?1 AND s.status = ?2",
        )
        .bind(since)
        .bind(PaymentStatus::Paid)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Helper to generate a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new sale item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::lot::generate_lot_id;
    use tally_core::ProductLot;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_lot(db: &Database, quantity: i64) -> ProductLot {
        let now = Utc::now();
        let lot = ProductLot {
            id: generate_lot_id(),
            product_name: "Ballpoint Pen".to_string(),
            quantity,
            purchase_price_cents: 100,
            customer_price_cents: 150,
            wholesale_price_cents: Some(120),
            supplier: None,
            purchase_date: now,
            created_at: now,
            updated_at: now,
        };
        db.lots().insert(&lot).await.unwrap();
        lot
    }

    fn sale_header(sale_type: SaleType, customer: &str) -> Sale {
        let now = Utc::now();
        Sale {
            id: generate_sale_id(),
            salesperson: "Asha".to_string(),
            sale_type,
            buyer: Buyer::Customer,
            customer_name: customer.to_string(),
            status: sale_type.default_status(),
            sale_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(sale: &Sale, lot: &ProductLot, quantity: i64) -> SaleItem {
        SaleItem {
            id: generate_item_id(),
            sale_id: sale.id.clone(),
            lot_id: lot.id.clone(),
            name_snapshot: lot.product_name.clone(),
            quantity,
            sold_price_cents: lot.customer_price_cents,
            cost_price_cents: lot.purchase_price_cents,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_decrements_stock_and_persists() {
        let db = test_db().await;
        let lot = seeded_lot(&db, 10).await;

        let sale = sale_header(SaleType::Cash, "walk-in");
        let items = vec![line(&sale, &lot, 4)];
        db.sales().create_with_stock(&sale, &items).await.unwrap();

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);

        let stored_items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(stored_items.len(), 1);
        assert_eq!(stored_items[0].name_snapshot, "Ballpoint Pen");

        let after = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 6);
    }

    #[tokio::test]
    async fn test_create_is_all_or_nothing() {
        let db = test_db().await;
        let good = seeded_lot(&db, 10).await;
        let thin = seeded_lot(&db, 2).await;

        let sale = sale_header(SaleType::Cash, "walk-in");
        // First line fits, second overdraws: neither may take effect.
        let items = vec![line(&sale, &good, 5), line(&sale, &thin, 3)];
        let err = db.sales().create_with_stock(&sale, &items).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { available: 2, .. }));

        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
        let untouched = db.lots().get_by_id(&good.id).await.unwrap().unwrap();
        assert_eq!(untouched.quantity, 10);
    }

    #[tokio::test]
    async fn test_reversal_restores_stock_and_removes_sale() {
        let db = test_db().await;
        let lot = seeded_lot(&db, 8).await;

        let sale = sale_header(SaleType::Cash, "walk-in");
        let items = vec![line(&sale, &lot, 3)];
        db.sales().create_with_stock(&sale, &items).await.unwrap();

        let missing = db.sales().delete_with_restock(&sale.id).await.unwrap();
        assert!(missing.is_empty());

        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
        assert!(db.sales().get_items(&sale.id).await.unwrap().is_empty());

        let after = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 8);
    }

    #[tokio::test]
    async fn test_reversal_tolerates_deleted_lot() {
        let db = test_db().await;
        let lot = seeded_lot(&db, 8).await;

        let sale = sale_header(SaleType::Cash, "walk-in");
        let items = vec![line(&sale, &lot, 3)];
        db.sales().create_with_stock(&sale, &items).await.unwrap();

        db.lots().delete(&lot.id).await.unwrap();

        let missing = db.sales().delete_with_restock(&sale.id).await.unwrap();
        assert_eq!(missing, vec![lot.id.clone()]);
        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let db = test_db().await;
        let lot = seeded_lot(&db, 100).await;

        for i in 0..3 {
            let sale = sale_header(SaleType::Credit, &format!("Customer {i}"));
            db.sales()
                .create_with_stock(&sale, &[line(&sale, &lot, 1)])
                .await
                .unwrap();
        }
        let cash = sale_header(SaleType::Cash, "walk-in");
        db.sales()
            .create_with_stock(&cash, &[line(&cash, &lot, 1)])
            .await
            .unwrap();

        let mut filter = SaleFilter::new();
        filter.sale_type = Some(SaleType::Credit);
        filter.limit = 2;
        let page = db.sales().list(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.sales.len(), 2);
        assert!(page.sales.iter().all(|s| s.sale_type == SaleType::Credit));

        filter.status = Some(PaymentStatus::Paid);
        let page = db.sales().list(&filter).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_credit_lines_scoped_by_customer_and_status() {
        let db = test_db().await;
        let lot = seeded_lot(&db, 100).await;

        let credit = sale_header(SaleType::Credit, "Bilal Traders");
        db.sales()
            .create_with_stock(&credit, &[line(&credit, &lot, 2)])
            .await
            .unwrap();

        let other = sale_header(SaleType::Credit, "Someone Else");
        db.sales()
            .create_with_stock(&other, &[line(&other, &lot, 9)])
            .await
            .unwrap();

        let cash = sale_header(SaleType::Cash, "Bilal Traders");
        db.sales()
            .create_with_stock(&cash, &[line(&cash, &lot, 5)])
            .await
            .unwrap();

        let from = Utc::now() - chrono::Duration::hours(1);
        let until = Utc::now() + chrono::Duration::hours(1);
        let lines = db
            .sales()
            .credit_lines(
                &["Bilal Traders".to_string()],
                from,
                until,
                &[PaymentStatus::Unpaid],
            )
            .await
            .unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].sale_id, credit.id);
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_dashboard_scalars() {
        let db = test_db().await;
        let lot = seeded_lot(&db, 100).await;

        let sale = sale_header(SaleType::Cash, "walk-in");
        db.sales()
            .create_with_stock(&sale, &[line(&sale, &lot, 4)])
            .await
            .unwrap();

        let since = Utc::now() - chrono::Duration::hours(1);
        // 4 × 150 revenue, 4 × (150 − 100) profit
        assert_eq!(db.sales().revenue_since(since).await.unwrap(), 600);
        assert_eq!(db.sales().profit_since(since).await.unwrap(), 200);

        // Window excluding the sale
        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(db.sales().revenue_since(future).await.unwrap(), 0);
    }
}
