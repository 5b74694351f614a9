//! # Lot Repository
//!
//! Database operations for product lots — the inventory ledger.
//!
//! ## Stock Updates Are Conditional
//! ```text
//! WRONG: read quantity, check in Rust, write quantity back
//!        (two sales can both pass the check, then oversell)
//!
//! RIGHT: UPDATE lots SET quantity = quantity - ?
//!        WHERE id = ? AND quantity >= ?
//!        (the check and the decrement are one indivisible statement;
//!         zero rows affected means insufficient stock)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::ProductLot;

const LOT_COLUMNS: &str = "id, product_name, quantity, purchase_price_cents, \
     customer_price_cents, wholesale_price_cents, supplier, purchase_date, \
     created_at, updated_at";

/// Repository for product lot database operations.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Inserts a new lot (a purchase entry).
    pub async fn insert(&self, lot: &ProductLot) -> DbResult<()> {
        debug!(id = %lot.id, product = %lot.product_name, "Inserting lot");

        sqlx::query(
            r#"
            INSERT INTO lots (
                id, product_name, quantity,
                purchase_price_cents, customer_price_cents, wholesale_price_cents,
                supplier, purchase_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.product_name)
        .bind(lot.quantity)
        .bind(lot.purchase_price_cents)
        .bind(lot.customer_price_cents)
        .bind(lot.wholesale_price_cents)
        .bind(&lot.supplier)
        .bind(lot.purchase_date)
        .bind(lot.created_at)
        .bind(lot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a lot by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductLot>> {
        let lot = sqlx::query_as::<_, ProductLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM lots WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Lists all lots, newest purchase first.
    pub async fn list(&self) -> DbResult<Vec<ProductLot>> {
        let lots = sqlx::query_as::<_, ProductLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM lots ORDER BY purchase_date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Deletes a lot.
    ///
    /// Independent of sale history: line item snapshots keep the frozen
    /// name/price/cost, they only lose the ability to restore stock on
    /// reversal.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting lot");

        let result = sqlx::query("DELETE FROM lots WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product lot", id));
        }

        Ok(())
    }

    /// Reserves `qty` units from a lot: atomically subtracts the quantity
    /// and returns the lot snapshot as of just before the subtraction.
    ///
    /// ## Errors
    /// - `NotFound` if the lot does not exist
    /// - `StockConflict` if the conditional decrement affected zero rows
    ///   (on-hand quantity below `qty`, possibly due to a concurrent sale)
    pub async fn reserve(&self, id: &str, qty: i64) -> DbResult<ProductLot> {
        debug!(id = %id, qty = %qty, "Reserving stock");

        let lot = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product lot", id))?;

        let decremented = try_decrement(&self.pool, id, qty, Utc::now()).await?;
        if !decremented {
            // Re-read for an up-to-date availability figure; the snapshot
            // read above may predate a concurrent decrement.
            let available = self.get_by_id(id).await?.map(|l| l.quantity).unwrap_or(0);
            return Err(DbError::StockConflict {
                lot_id: id.to_string(),
                available,
            });
        }

        Ok(lot)
    }

    /// Releases `qty` units back onto a lot (used by sale reversal).
    ///
    /// Returns `false` when the lot no longer exists — the caller treats
    /// restoration as best-effort per line item.
    pub async fn release(&self, id: &str, qty: i64) -> DbResult<bool> {
        debug!(id = %id, qty = %qty, "Releasing stock");

        try_increment(&self.pool, id, qty, Utc::now()).await
    }

    /// Counts lots with quantity strictly below `threshold`.
    pub async fn count_low_stock(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lots WHERE quantity < ?1")
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-Generic Stock Mutations
// =============================================================================
// These take any executor so the sale repository can run them inside its
// own transaction (all-or-nothing sale commit).

/// Conditionally decrements a lot's quantity.
///
/// Returns `true` when a row was updated; `false` means the lot is missing
/// or its quantity is below `qty` — the caller distinguishes the two.
pub(crate) async fn try_decrement<'e, E>(
    executor: E,
    lot_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    // A non-positive qty would increment stock through the subtraction.
    if qty <= 0 {
        return Ok(false);
    }

    let result = sqlx::query(
        r#"
        UPDATE lots
        SET quantity = quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        "#,
    )
    .bind(lot_id)
    .bind(qty)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Increments a lot's quantity. Returns `false` when the lot is gone.
pub(crate) async fn try_increment<'e, E>(
    executor: E,
    lot_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE lots
        SET quantity = quantity + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(lot_id)
    .bind(qty)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Helper to generate a new lot ID.
pub fn generate_lot_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_lot(quantity: i64) -> ProductLot {
        let now = Utc::now();
        ProductLot {
            id: generate_lot_id(),
            product_name: "A4 Paper 80gsm".to_string(),
            quantity,
            purchase_price_cents: 400,
            customer_price_cents: 600,
            wholesale_price_cents: Some(500),
            supplier: Some("Paper Mills Ltd".to_string()),
            purchase_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let lot = sample_lot(10);
        db.lots().insert(&lot).await.unwrap();

        let fetched = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(fetched.product_name, "A4 Paper 80gsm");
        assert_eq!(fetched.quantity, 10);
        assert_eq!(fetched.wholesale_price_cents, Some(500));
    }

    #[tokio::test]
    async fn test_reserve_decrements_and_snapshots() {
        let db = test_db().await;
        let lot = sample_lot(10);
        db.lots().insert(&lot).await.unwrap();

        let snapshot = db.lots().reserve(&lot.id, 3).await.unwrap();
        // Snapshot is pre-decrement
        assert_eq!(snapshot.quantity, 10);

        let after = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 7);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_leaves_stock_untouched() {
        let db = test_db().await;
        let lot = sample_lot(7);
        db.lots().insert(&lot).await.unwrap();

        let err = db.lots().reserve(&lot.id, 20).await.unwrap_err();
        match err {
            DbError::StockConflict { available, .. } => assert_eq!(available, 7),
            other => panic!("expected StockConflict, got {other:?}"),
        }

        let after = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 7);
    }

    #[tokio::test]
    async fn test_reserve_rejects_non_positive_quantity() {
        let db = test_db().await;
        let lot = sample_lot(7);
        db.lots().insert(&lot).await.unwrap();

        for qty in [0, -4] {
            let err = db.lots().reserve(&lot.id, qty).await.unwrap_err();
            assert!(matches!(err, DbError::StockConflict { .. }));
        }

        let after = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 7);
    }

    #[tokio::test]
    async fn test_reserve_missing_lot() {
        let db = test_db().await;
        let err = db.lots().reserve("no-such-lot", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let db = test_db().await;
        let lot = sample_lot(5);
        db.lots().insert(&lot).await.unwrap();

        db.lots().reserve(&lot.id, 5).await.unwrap();
        let restored = db.lots().release(&lot.id, 5).await.unwrap();
        assert!(restored);

        let after = db.lots().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 5);
    }

    #[tokio::test]
    async fn test_release_missing_lot_is_tolerated() {
        let db = test_db().await;
        let restored = db.lots().release("gone", 5).await.unwrap();
        assert!(!restored);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let lot = sample_lot(1);
        db.lots().insert(&lot).await.unwrap();

        db.lots().delete(&lot.id).await.unwrap();
        assert!(db.lots().get_by_id(&lot.id).await.unwrap().is_none());

        let err = db.lots().delete(&lot.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_count_low_stock() {
        let db = test_db().await;
        db.lots().insert(&sample_lot(2)).await.unwrap();
        db.lots().insert(&sample_lot(4)).await.unwrap();
        db.lots().insert(&sample_lot(5)).await.unwrap();
        db.lots().insert(&sample_lot(50)).await.unwrap();

        let low = db.lots().count_low_stock(5).await.unwrap();
        assert_eq!(low, 2);
    }
}
