//! # Price Resolution
//!
//! Resolves the unit price charged for a sale line item.
//!
//! ## Resolution Order
//! ```text
//! explicit price supplied and > 0 ─────────────► use it
//!        │
//!        ▼
//! buyer is wholesale and lot has a wholesale
//! price ───────────────────────────────────────► wholesale price
//!        │
//!        ▼
//! otherwise ───────────────────────────────────► customer price
//! ```
//!
//! An explicit price of zero is treated as "not supplied" and falls through
//! to the category price, mirroring the cashier UI sending 0 for untouched
//! price fields.

use crate::money::Money;
use crate::types::{Buyer, ProductLot};

/// Resolves the unit price for one line item.
///
/// `explicit` is the optional cashier-entered override; it wins whenever it
/// is present and positive.
pub fn resolve_unit_price(explicit: Option<Money>, buyer: Buyer, lot: &ProductLot) -> Money {
    if let Some(price) = explicit {
        if price.is_positive() {
            return price;
        }
    }

    match buyer {
        Buyer::Wholesale => lot.wholesale_price().unwrap_or_else(|| lot.customer_price()),
        Buyer::Customer => lot.customer_price(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn lot(customer_cents: i64, wholesale_cents: Option<i64>) -> ProductLot {
        ProductLot {
            id: "lot-1".to_string(),
            product_name: "Glossy Card 300gsm".to_string(),
            quantity: 10,
            purchase_price_cents: 4000,
            customer_price_cents: customer_cents,
            wholesale_price_cents: wholesale_cents,
            supplier: None,
            purchase_date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_explicit_price_wins() {
        let lot = lot(10000, Some(8000));
        let price = resolve_unit_price(Some(Money::from_cents(7500)), Buyer::Customer, &lot);
        assert_eq!(price.cents(), 7500);

        // Explicit price also beats the wholesale price
        let price = resolve_unit_price(Some(Money::from_cents(7500)), Buyer::Wholesale, &lot);
        assert_eq!(price.cents(), 7500);
    }

    #[test]
    fn test_zero_explicit_price_falls_through() {
        let lot = lot(10000, Some(8000));
        let price = resolve_unit_price(Some(Money::zero()), Buyer::Customer, &lot);
        assert_eq!(price.cents(), 10000);
    }

    #[test]
    fn test_category_price() {
        let lot = lot(10000, Some(8000));
        assert_eq!(
            resolve_unit_price(None, Buyer::Customer, &lot).cents(),
            10000
        );
        assert_eq!(
            resolve_unit_price(None, Buyer::Wholesale, &lot).cents(),
            8000
        );
    }

    #[test]
    fn test_wholesale_falls_back_to_customer_price() {
        let lot = lot(10000, None);
        assert_eq!(
            resolve_unit_price(None, Buyer::Wholesale, &lot).cents(),
            10000
        );
    }
}
