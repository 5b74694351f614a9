//! # Sale Workflows
//!
//! Recording, reversing and listing sales.
//!
//! ## Recording a Sale
//! ```text
//! validate items ──► resolve lots ──► resolve prices ──► commit
//!  (fail fast)       (name + cost      (explicit wins,    (one transaction:
//!                     snapshots)        wholesale falls    stock decrements +
//!                                       back)              header + lines)
//! ```
//!
//! Validation fails fast: the first bad line item aborts the request and
//! nothing is persisted. The commit itself is all-or-nothing at the
//! database layer, so a concurrent sale that drains a lot between the
//! pre-check and the commit still cannot produce a partial sale.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use tally_core::{
    calendar, pricing, validation, Buyer, CoreError, Money, PaymentStatus, Principal, Sale,
    SaleItem, SaleType, WALK_IN_CUSTOMER,
};
use tally_db::repository::sale::{generate_item_id, generate_sale_id};
use tally_db::{Database, DbError, SaleFilter, SaleSortField, SortOrder};

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// One requested line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub lot_id: String,
    pub quantity: i64,
    /// Cashier-entered price override in cents. Zero or absent means "use
    /// the category price".
    #[serde(default)]
    pub price_cents: Option<i64>,
}

/// A sale submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub sale_type: SaleType,
    #[serde(default)]
    pub buyer: Buyer,
    /// Required for credit sales; other sales default to the walk-in
    /// sentinel.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Backdated entry support; defaults to now.
    #[serde(default)]
    pub sale_date: Option<DateTime<Utc>>,
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale_id: String,
    pub status: PaymentStatus,
    pub customer_name: String,
    pub total_cents: i64,
    pub profit_cents: i64,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalReport {
    pub sale_id: String,
    pub restored_items: usize,
    /// Lots that were deleted since the sale; their stock could not be
    /// restored.
    pub skipped_lots: Vec<String>,
}

/// Listing query as the router receives it. Sort inputs arrive as strings
/// and are parsed against a whitelist; anything unrecognized falls back to
/// the default (sale date, newest first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleListQuery {
    #[serde(default)]
    pub sale_type: Option<SaleType>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub buyer: Option<Buyer>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Substring match against any line item's product name.
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

/// A sale header together with its line items, as listings return them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleListPage {
    pub sales: Vec<SaleWithItems>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
}

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 200;

impl SaleListQuery {
    fn into_filter(self) -> SaleFilter {
        let sort = match self.sort_by.as_deref() {
            Some("customerName") | Some("customer_name") => SaleSortField::CustomerName,
            Some("saleType") | Some("sale_type") => SaleSortField::SaleType,
            Some("status") => SaleSortField::Status,
            _ => SaleSortField::SaleDate,
        };
        let order = match self.order.as_deref() {
            Some("asc") | Some("ASC") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).max(1);

        SaleFilter {
            sale_type: self.sale_type,
            status: self.status,
            buyer: self.buyer,
            customer_name: self.customer_name,
            product_name: self.product_name,
            from: self.from.map(calendar::start_of_day),
            until: self.until.map(calendar::end_of_day),
            sort,
            order,
            limit: per_page,
            offset: (page - 1) * per_page,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Sale recording, reversal and listing.
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
}

impl SaleService {
    pub fn new(db: Database) -> Self {
        SaleService { db }
    }

    /// Records a sale on behalf of the authenticated principal.
    ///
    /// ## Validation Order
    /// 1. Item list must be non-empty
    /// 2. Every quantity must be positive
    /// 3. Every lot must exist and currently cover its quantity
    /// 4. Credit sales must name a real customer
    pub async fn record_sale(
        &self,
        principal: &Principal,
        req: CreateSaleRequest,
    ) -> ServiceResult<SaleReceipt> {
        if req.items.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }

        for line in &req.items {
            if validation::validate_quantity(line.quantity).is_err() {
                return Err(CoreError::InvalidQuantity { got: line.quantity }.into());
            }
            if let Some(cents) = line.price_cents {
                validation::validate_price_cents(cents).map_err(CoreError::from)?;
            }
        }

        // Pre-check availability so most bad requests fail with the product
        // name before any stock moves. The commit re-checks under the
        // transaction.
        let mut lots = HashMap::new();
        for line in &req.items {
            if !lots.contains_key(&line.lot_id) {
                let lot = self
                    .db
                    .lots()
                    .get_by_id(&line.lot_id)
                    .await?
                    .ok_or_else(|| CoreError::LotNotFound(line.lot_id.clone()))?;
                lots.insert(line.lot_id.clone(), lot);
            }
        }
        let mut requested_per_lot: HashMap<&str, i64> = HashMap::new();
        for line in &req.items {
            *requested_per_lot.entry(line.lot_id.as_str()).or_default() += line.quantity;
        }
        for (lot_id, requested) in &requested_per_lot {
            let lot = &lots[*lot_id];
            if !lot.can_fill(*requested) {
                return Err(CoreError::InsufficientStock {
                    product: lot.product_name.clone(),
                    available: lot.quantity,
                    requested: *requested,
                }
                .into());
            }
        }

        let customer_name = match req.sale_type {
            SaleType::Credit => {
                let name = req.customer_name.as_deref().unwrap_or("").trim();
                if validation::validate_credit_customer(name).is_err() {
                    return Err(CoreError::MissingCustomer.into());
                }
                name.to_string()
            }
            _ => req
                .customer_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(WALK_IN_CUSTOMER)
                .to_string(),
        };

        let now = Utc::now();
        let sale = Sale {
            id: generate_sale_id(),
            salesperson: principal.name.clone(),
            sale_type: req.sale_type,
            buyer: req.buyer,
            customer_name,
            status: req.sale_type.default_status(),
            sale_date: req.sale_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        let items: Vec<SaleItem> = req
            .items
            .iter()
            .map(|line| {
                let lot = &lots[&line.lot_id];
                let unit_price = pricing::resolve_unit_price(
                    line.price_cents.map(Money::from_cents),
                    req.buyer,
                    lot,
                );
                SaleItem {
                    id: generate_item_id(),
                    sale_id: sale.id.clone(),
                    lot_id: lot.id.clone(),
                    name_snapshot: lot.product_name.clone(),
                    quantity: line.quantity,
                    sold_price_cents: unit_price.cents(),
                    cost_price_cents: lot.purchase_price_cents,
                    created_at: now,
                }
            })
            .collect();

        match self.db.sales().create_with_stock(&sale, &items).await {
            Ok(()) => {}
            // A concurrent sale won the race for a lot between the pre-check
            // and the commit; report it with the product name.
            Err(DbError::StockConflict { lot_id, available }) => {
                let product = lots
                    .get(&lot_id)
                    .map(|l| l.product_name.clone())
                    .unwrap_or_else(|| lot_id.clone());
                let requested = requested_per_lot.get(lot_id.as_str()).copied().unwrap_or(0);
                return Err(CoreError::InsufficientStock {
                    product,
                    available,
                    requested,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        let total: i64 = items.iter().map(|i| i.line_total().cents()).sum();
        let profit: i64 = items.iter().map(|i| i.line_profit().cents()).sum();

        info!(
            sale_id = %sale.id,
            salesperson = %sale.salesperson,
            total = %total,
            items = items.len(),
            "Sale recorded"
        );

        Ok(SaleReceipt {
            sale_id: sale.id,
            status: sale.status,
            customer_name: sale.customer_name,
            total_cents: total,
            profit_cents: profit,
            item_count: items.len(),
        })
    }

    /// Reverses a sale: stock goes back onto surviving lots and the sale
    /// disappears from listings and rollups.
    pub async fn reverse_sale(&self, sale_id: &str) -> ServiceResult<ReversalReport> {
        let items = self.db.sales().get_items(sale_id).await?;
        let item_count = items.len();

        let skipped = match self.db.sales().delete_with_restock(sale_id).await {
            Ok(skipped) => skipped,
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::SaleNotFound(sale_id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        if !skipped.is_empty() {
            warn!(
                sale_id = %sale_id,
                lots = ?skipped,
                "Reversal skipped stock restoration for deleted lots"
            );
        }

        info!(sale_id = %sale_id, restored = item_count - skipped.len(), "Sale reversed");

        Ok(ReversalReport {
            sale_id: sale_id.to_string(),
            restored_items: item_count - skipped.len(),
            skipped_lots: skipped,
        })
    }

    /// Gets a sale with its line items.
    pub async fn get_sale(&self, sale_id: &str) -> ServiceResult<(Sale, Vec<SaleItem>)> {
        let sale = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;
        let items = self.db.sales().get_items(sale_id).await?;
        Ok((sale, items))
    }

    /// Lists sales with filtering, sorting and pagination. Each listed
    /// sale carries its line items.
    pub async fn list_sales(&self, query: SaleListQuery) -> ServiceResult<SaleListPage> {
        let page = query.page.unwrap_or(1).max(1);
        let filter = query.into_filter();
        let per_page = filter.limit;

        let result = self.db.sales().list(&filter).await?;

        let mut sales = Vec::with_capacity(result.sales.len());
        for sale in result.sales {
            let items = self.db.sales().get_items(&sale.id).await?;
            sales.push(SaleWithItems { sale, items });
        }

        let pages = if result.total == 0 {
            0
        } else {
            (result.total + per_page - 1) / per_page
        };

        Ok(SaleListPage {
            sales,
            total: result.total,
            page,
            pages,
            per_page,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
