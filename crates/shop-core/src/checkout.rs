//! # Checkout Pricing
//!
//! The pure half of the sale commit protocol: cart validation and the
//! accounting identity.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Lifecycle                                │
//! │                                                                         │
//! │  Building (client-side cart, not modeled here)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Validating ← THIS MODULE (CheckoutDraft::price)                        │
//! │       │   reject empty cart, bad quantities, total mismatch             │
//! │       ▼                                                                 │
//! │  Committing (shop-db SaleRepository, one transaction)                   │
//! │       │   receipt id + sale header + items + stock decrements           │
//! │       ▼                                                                 │
//! │  Committed ──or── Aborted (no trace left behind)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The invariant everything downstream relies on:
//!
//! `sum(line.quantity * line.unit_price) - discount == total`  (floored at 0)
//!
//! Totals are always recomputed here from the line items. A caller-claimed
//! total is only ever *checked*, never trusted.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart, exactly as the register captured it.
///
/// `product_name` and `unit_price` are the values at add-to-cart time.
/// They are snapshotted onto the receipt as-is; the commit never re-reads
/// the live product for pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl CartLine {
    /// The line's contribution to the subtotal.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Checkout Draft
// =============================================================================

/// An unvalidated cart as submitted by the caller.
#[derive(Debug, Clone)]
pub struct CheckoutDraft {
    pub lines: Vec<CartLine>,
    pub discount: Money,
    /// The total the caller's cart computed, re-validated against the
    /// line items before any commit starts.
    pub claimed_total: Option<Money>,
}

impl CheckoutDraft {
    /// Validates the cart and prices it.
    ///
    /// ## Checks, in order
    /// 1. cart is non-empty
    /// 2. every quantity is in `1..=MAX_ITEM_QUANTITY`
    /// 3. no unit price or the discount is negative
    /// 4. the claimed total (if supplied) matches the recomputed one
    ///
    /// ## Returns
    /// A [`PricedOrder`] whose totals satisfy the accounting identity, or
    /// the first violated rule.
    pub fn price(self) -> CoreResult<PricedOrder> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        if self.lines.len() > MAX_CART_ITEMS {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_CART_ITEMS as i64,
            }
            .into());
        }

        if self.discount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let mut subtotal = Money::zero();
        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
            if line.quantity > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            if line.unit_price.is_negative() {
                return Err(ValidationError::OutOfRange {
                    field: "price".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into());
            }
            subtotal += line.line_total();
        }

        let total = subtotal.sub_to_zero(self.discount);

        if let Some(claimed) = self.claimed_total {
            if claimed != total {
                return Err(CoreError::TotalMismatch {
                    claimed_cents: claimed.cents(),
                    computed_cents: total.cents(),
                });
            }
        }

        Ok(PricedOrder {
            lines: self.lines,
            discount: self.discount,
            subtotal,
            total,
        })
    }
}

// =============================================================================
// Priced Order
// =============================================================================

/// A validated, priced cart ready to commit.
///
/// Construction goes through [`CheckoutDraft::price`] only, so holding a
/// `PricedOrder` means the accounting identity already holds.
#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub lines: Vec<CartLine>,
    pub discount: Money,
    pub subtotal: Money,
    /// Amount actually charged: `max(subtotal - discount, 0)`.
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, qty: i64, price_cents: i64) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            product_name: format!("Product {id}"),
            quantity: qty,
            unit_price: Money::from_cents(price_cents),
        }
    }

    fn draft(lines: Vec<CartLine>, discount_cents: i64) -> CheckoutDraft {
        CheckoutDraft {
            lines,
            discount: Money::from_cents(discount_cents),
            claimed_total: None,
        }
    }

    #[test]
    fn test_prices_single_line() {
        // qty 2 at $0.10 with no discount charges $0.20
        let order = draft(vec![line("p1", 2, 10)], 0).price().unwrap();
        assert_eq!(order.subtotal.cents(), 20);
        assert_eq!(order.total.cents(), 20);
    }

    #[test]
    fn test_prices_multiple_lines_with_discount() {
        let order = draft(vec![line("p1", 2, 1000), line("p2", 1, 500)], 300)
            .price()
            .unwrap();
        assert_eq!(order.subtotal.cents(), 2500);
        assert_eq!(order.total.cents(), 2200);
    }

    #[test]
    fn test_discount_floors_at_zero() {
        // discount 15 on a subtotal of 10 charges 0, not -5
        let order = draft(vec![line("p1", 1, 10)], 15).price().unwrap();
        assert_eq!(order.total.cents(), 0);
    }

    #[test]
    fn test_rejects_empty_cart() {
        let err = draft(vec![], 0).price().unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let err = draft(vec![line("p1", 0, 100)], 0).price().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = draft(vec![line("p1", -3, 100)], 0).price().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_rejects_oversized_quantity() {
        let err = draft(vec![line("p1", 1000, 100)], 0).price().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_rejects_negative_price_and_discount() {
        let err = draft(vec![line("p1", 1, -100)], 0).price().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = draft(vec![line("p1", 1, 100)], -50).price().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_claimed_total_must_match() {
        let mut d = draft(vec![line("p1", 2, 1000)], 0);
        d.claimed_total = Some(Money::from_cents(2000));
        assert!(d.clone().price().is_ok());

        d.claimed_total = Some(Money::from_cents(1999));
        let err = d.price().unwrap_err();
        assert!(matches!(
            err,
            CoreError::TotalMismatch {
                claimed_cents: 1999,
                computed_cents: 2000
            }
        ));
    }
}
