//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ProductLot          Sale + SaleItem        Billing + BillingLine
//! ──────────          ───────────────        ─────────────────────
//! id (UUID)           id (UUID)              id (UUID)
//! product_name        salesperson            buyer label
//! quantity (>= 0)     sale_type / buyer      date range
//! cost / prices       status / items         credit line snapshots
//!
//! Employee            Principal
//! ────────            ─────────
//! id (UUID)           id / name / role
//! email (unique)      (supplied by the
//! role                 external identity
//!                      provider)
//! ```
//!
//! ## Snapshot Pattern
//! Sale line items and billing lines freeze product data (name, price,
//! cost) at the moment they are written. Later edits to a lot never
//! retroactively change historical revenue or profit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Sale Type
// =============================================================================

/// How a sale was (or will be) paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum SaleType {
    /// Paid in cash at the counter.
    Cash,
    /// Paid via a mobile transfer app.
    MobileTransfer,
    /// Not paid at time of sale; tracked as a receivable until billed.
    Credit,
}

impl SaleType {
    /// Computed payment-status default for this sale type.
    ///
    /// Credit sales start life unpaid; everything else is settled at the
    /// counter. This is the explicit construction-time default — there is
    /// no schema-level conditional.
    pub fn default_status(&self) -> PaymentStatus {
        match self {
            SaleType::Credit => PaymentStatus::Unpaid,
            SaleType::Cash | SaleType::MobileTransfer => PaymentStatus::Paid,
        }
    }
}

impl Default for SaleType {
    fn default() -> Self {
        SaleType::Cash
    }
}

// =============================================================================
// Buyer Category
// =============================================================================

/// Which price list applies to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Buyer {
    /// Retail customer, charged the customer price.
    Customer,
    /// Wholesale buyer, charged the wholesale price when the lot has one.
    Wholesale,
}

impl Default for Buyer {
    fn default() -> Self {
        Buyer::Customer
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Whether a sale or billing record has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    /// Returns the opposite status (used by billing settlement toggles).
    pub fn toggled(&self) -> PaymentStatus {
        match self {
            PaymentStatus::Paid => PaymentStatus::Unpaid,
            PaymentStatus::Unpaid => PaymentStatus::Paid,
        }
    }
}

// =============================================================================
// Product Lot
// =============================================================================

/// One purchased batch of a product with its own cost, prices and stock.
///
/// Quantity never goes negative: every decrement is a conditional update
/// at the storage layer and a decrement that would overdraw is rejected
/// before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductLot {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on receipts.
    pub product_name: String,

    /// Quantity on hand. Integer, never negative.
    pub quantity: i64,

    /// Unit cost in cents (profit basis).
    pub purchase_price_cents: i64,

    /// Unit price charged to retail customers, in cents.
    pub customer_price_cents: i64,

    /// Unit price charged to wholesale buyers, in cents. Optional; lots
    /// without one fall back to the customer price.
    pub wholesale_price_cents: Option<i64>,

    /// Supplier the lot was bought from.
    pub supplier: Option<String>,

    /// When the lot was purchased.
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ProductLot {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Returns the retail price as Money.
    #[inline]
    pub fn customer_price(&self) -> Money {
        Money::from_cents(self.customer_price_cents)
    }

    /// Returns the wholesale price as Money, if the lot carries one.
    #[inline]
    pub fn wholesale_price(&self) -> Option<Money> {
        self.wholesale_price_cents.map(Money::from_cents)
    }

    /// Checks whether the lot can fulfil a line item of `quantity`.
    pub fn can_fill(&self, quantity: i64) -> bool {
        quantity > 0 && self.quantity >= quantity
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction (header; line items live in [`SaleItem`]).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Name of the authenticated employee who recorded the sale.
    pub salesperson: String,
    pub sale_type: SaleType,
    pub buyer: Buyer,
    /// Buyer's name; defaults to the walk-in sentinel for anonymous sales.
    pub customer_name: String,
    pub status: PaymentStatus,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze lot data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// The lot the stock was drawn from. Weak reference: the lot may be
    /// deleted later without touching this row.
    pub lot_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price charged, in cents (frozen).
    pub sold_price_cents: i64,
    /// Unit cost at time of sale, in cents (frozen profit basis).
    pub cost_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price charged as Money.
    #[inline]
    pub fn sold_price(&self) -> Money {
        Money::from_cents(self.sold_price_cents)
    }

    /// Returns the line total (price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.sold_price().multiply_quantity(self.quantity)
    }

    /// Returns the line profit ((price − cost) × quantity).
    #[inline]
    pub fn line_profit(&self) -> Money {
        Money::from_cents(self.sold_price_cents - self.cost_price_cents)
            .multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Billing
// =============================================================================

/// A generated invoice aggregating credit sales for settlement.
///
/// A billing record is a derived aggregate: it back-references the sales it
/// covers by id (used to cascade status, never to cascade deletion) and is
/// mutated only by settlement toggles.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Billing {
    pub id: String,
    /// Buyer label for the bill.
    pub buyer: String,
    /// Start of the covered range (calendar date).
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// End of the covered range (calendar date, inclusive of the whole day).
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    /// Sum of quantity × price across all lines, in cents.
    pub total_cents: i64,
    pub status: PaymentStatus,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
}

impl Billing {
    /// Returns the billing total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One credit-sale line snapshot embedded in a billing record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BillingLine {
    pub id: String,
    pub billing_id: String,
    /// Weak reference to the originating sale.
    pub sale_id: String,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub sold_price_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

impl BillingLine {
    /// Returns the line total (price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.sold_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Employee
// =============================================================================

/// Employee role. Owners can manage staff and settle bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Employee,
}

impl Default for Role {
    fn default() -> Self {
        Role::Employee
    }
}

/// An employee record.
///
/// Credentials are not stored here: password hashing and session issuance
/// belong to the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub salary_cents: Option<i64>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub joined_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_login: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Principal
// =============================================================================

/// The authenticated caller, as supplied by the external identity provider.
///
/// The core trusts this without re-validating it; `name` is recorded as the
/// salesperson on sales the principal creates.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub role: Role,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_law() {
        // Credit sales default to unpaid; everything else to paid.
        assert_eq!(SaleType::Credit.default_status(), PaymentStatus::Unpaid);
        assert_eq!(SaleType::Cash.default_status(), PaymentStatus::Paid);
        assert_eq!(
            SaleType::MobileTransfer.default_status(),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(PaymentStatus::Paid.toggled(), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::Unpaid.toggled(), PaymentStatus::Paid);
    }

    #[test]
    fn test_sale_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&SaleType::MobileTransfer).unwrap(),
            "\"mobile-transfer\""
        );
        assert_eq!(serde_json::to_string(&SaleType::Cash).unwrap(), "\"cash\"");
    }

    #[test]
    fn test_lot_can_fill() {
        let lot = ProductLot {
            id: "lot-1".to_string(),
            product_name: "A4 Paper".to_string(),
            quantity: 10,
            purchase_price_cents: 400,
            customer_price_cents: 600,
            wholesale_price_cents: Some(500),
            supplier: None,
            purchase_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(lot.can_fill(10));
        assert!(lot.can_fill(1));
        assert!(!lot.can_fill(11));
        assert!(!lot.can_fill(0));
        assert!(!lot.can_fill(-3));
    }

    #[test]
    fn test_sale_item_math() {
        let item = SaleItem {
            id: "i-1".to_string(),
            sale_id: "s-1".to_string(),
            lot_id: "lot-1".to_string(),
            name_snapshot: "A4 Paper".to_string(),
            quantity: 3,
            sold_price_cents: 600,
            cost_price_cents: 400,
            created_at: Utc::now(),
        };

        assert_eq!(item.line_total().cents(), 1800);
        assert_eq!(item.line_profit().cents(), 600);
    }
}
