//! # Inventory Workflows
//!
//! Purchase entry (new lots), listing and removal. Stock movement from
//! sales lives in the sale workflows; this module only covers the
//! purchasing side of the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServiceResult;
use tally_core::{validation, CoreError, ProductLot};
use tally_db::repository::lot::generate_lot_id;
use tally_db::{Database, DbError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLotRequest {
    pub product_name: String,
    pub quantity: i64,
    /// Unit cost in cents.
    pub purchase_price_cents: i64,
    pub customer_price_cents: i64,
    #[serde(default)]
    pub wholesale_price_cents: Option<i64>,
    #[serde(default)]
    pub supplier: Option<String>,
    /// Backdated purchase support; defaults to now.
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
}

/// Purchase entry and lot management.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    /// Records a purchase as a new lot.
    pub async fn add_lot(&self, req: CreateLotRequest) -> ServiceResult<ProductLot> {
        validation::validate_product_name(&req.product_name).map_err(CoreError::from)?;
        if validation::validate_quantity(req.quantity).is_err() {
            return Err(CoreError::InvalidQuantity { got: req.quantity }.into());
        }
        validation::validate_price_cents(req.purchase_price_cents).map_err(CoreError::from)?;
        validation::validate_price_cents(req.customer_price_cents).map_err(CoreError::from)?;
        if let Some(cents) = req.wholesale_price_cents {
            validation::validate_price_cents(cents).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let lot = ProductLot {
            id: generate_lot_id(),
            product_name: req.product_name.trim().to_string(),
            quantity: req.quantity,
            purchase_price_cents: req.purchase_price_cents,
            customer_price_cents: req.customer_price_cents,
            wholesale_price_cents: req.wholesale_price_cents,
            supplier: req
                .supplier
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            purchase_date: req.purchase_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        self.db.lots().insert(&lot).await?;

        info!(
            lot_id = %lot.id,
            product = %lot.product_name,
            quantity = %lot.quantity,
            "Lot recorded"
        );

        Ok(lot)
    }

    /// Lists all lots, newest purchase first.
    pub async fn list_lots(&self) -> ServiceResult<Vec<ProductLot>> {
        Ok(self.db.lots().list().await?)
    }

    /// Gets a lot by ID.
    pub async fn get_lot(&self, lot_id: &str) -> ServiceResult<ProductLot> {
        self.db
            .lots()
            .get_by_id(lot_id)
            .await?
            .ok_or_else(|| CoreError::LotNotFound(lot_id.to_string()).into())
    }

    /// Deletes a lot. Sale history is untouched; reversals of sales drawn
    /// from this lot will skip stock restoration.
    pub async fn delete_lot(&self, lot_id: &str) -> ServiceResult<()> {
        match self.db.lots().delete(lot_id).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound { .. }) => {
                Err(CoreError::LotNotFound(lot_id.to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::seeded_db;

    fn request(name: &str, quantity: i64) -> CreateLotRequest {
        CreateLotRequest {
            product_name: name.to_string(),
            quantity,
            purchase_price_cents: 400,
            customer_price_cents: 600,
            wholesale_price_cents: Some(500),
            supplier: Some("Paper Mills Ltd".to_string()),
            purchase_date: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let db = seeded_db().await;
        let inventory = InventoryService::new(db);

        let lot = inventory.add_lot(request("A4 Paper", 10)).await.unwrap();
        assert_eq!(lot.quantity, 10);

        let lots = inventory.list_lots().await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, lot.id);
    }

    #[tokio::test]
    async fn test_validation() {
        let db = seeded_db().await;
        let inventory = InventoryService::new(db);

        assert!(inventory.add_lot(request("", 10)).await.is_err());
        assert!(inventory.add_lot(request("A4 Paper", 0)).await.is_err());

        let mut bad_price = request("A4 Paper", 10);
        bad_price.customer_price_cents = -1;
        assert!(inventory.add_lot(bad_price).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_supplier_becomes_none() {
        let db = seeded_db().await;
        let inventory = InventoryService::new(db);

        let mut req = request("A4 Paper", 10);
        req.supplier = Some("   ".to_string());
        let lot = inventory.add_lot(req).await.unwrap();
        assert!(lot.supplier.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = seeded_db().await;
        let inventory = InventoryService::new(db);

        let lot = inventory.add_lot(request("A4 Paper", 10)).await.unwrap();
        inventory.delete_lot(&lot.id).await.unwrap();
        assert!(inventory.get_lot(&lot.id).await.is_err());

        let err = inventory.delete_lot(&lot.id).await.unwrap_err();
        assert_eq!(err.message, format!("Product lot not found: {}", lot.id));
    }
}
