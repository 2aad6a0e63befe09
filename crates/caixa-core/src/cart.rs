//! # Cart Math
//!
//! Pure functions for cart normalization and sale totals.
//!
//! ## The Total Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ quantity × unit_price_at_sale                             │
//! │  total    = max(0, subtotal - discount) + surcharge                     │
//! │                                                                         │
//! │  Before clamping, `subtotal - discount + surcharge` must be >= 0.      │
//! │  A discount that large means the caller sent a broken cart, so we      │
//! │  reject with NegativeTotal instead of hiding the bug behind max(0,·).  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is deterministic and storage-free; the checkout
//! coordinator in caixa-db calls these before it opens a transaction.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CartItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Priced Line
// =============================================================================

/// A cart line after catalog resolution: quantity plus the frozen
/// price/name snapshot that will be written to the sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl PricedLine {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart Normalization
// =============================================================================

/// Validates raw cart lines and merges duplicate product ids.
///
/// ## Rules
/// - Cart must be non-empty and hold at most [`MAX_CART_ITEMS`] distinct
///   products.
/// - Every quantity must be in `1..=MAX_ITEM_QUANTITY`, including the
///   merged quantity of duplicated lines.
/// - Duplicates merge into the *first* occurrence, preserving cart order,
///   because line items are keyed `(sale_id, product_id)`.
pub fn normalize_cart(items: &[CartItem]) -> CoreResult<Vec<CartItem>> {
    if items.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity <= 0 || item.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::InvalidQuantity {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }

        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity += item.quantity;
                if existing.quantity > MAX_ITEM_QUANTITY {
                    return Err(CoreError::InvalidQuantity {
                        product_id: existing.product_id.clone(),
                        quantity: existing.quantity,
                    });
                }
            }
            None => merged.push(item.clone()),
        }
    }

    if merged.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    Ok(merged)
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Computed monetary summary of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    pub total_cents: i64,
}

impl SaleTotals {
    /// Computes totals for a set of priced lines plus adjustments.
    ///
    /// ## Errors
    /// Returns [`CoreError::NegativeTotal`] when
    /// `subtotal - discount + surcharge` is negative (see module docs).
    ///
    /// ## Example
    /// ```rust
    /// use caixa_core::cart::{PricedLine, SaleTotals};
    ///
    /// let lines = vec![PricedLine {
    ///     product_id: "P1".into(),
    ///     name: "Coffee".into(),
    ///     unit_price_cents: 1000,
    ///     quantity: 2,
    /// }];
    /// let totals = SaleTotals::compute(&lines, 500, 0).unwrap();
    /// assert_eq!(totals.total_cents, 1500);
    /// ```
    pub fn compute(
        lines: &[PricedLine],
        discount_cents: i64,
        surcharge_cents: i64,
    ) -> CoreResult<SaleTotals> {
        let subtotal: Money = lines
            .iter()
            .map(PricedLine::line_total)
            .fold(Money::zero(), |acc, line| acc + line);

        let raw = subtotal - Money::from_cents(discount_cents) + Money::from_cents(surcharge_cents);
        if raw.is_negative() {
            return Err(CoreError::NegativeTotal {
                subtotal_cents: subtotal.cents(),
                discount_cents,
                surcharge_cents,
            });
        }

        let total = (subtotal - Money::from_cents(discount_cents)).clamp_non_negative()
            + Money::from_cents(surcharge_cents);

        Ok(SaleTotals {
            subtotal_cents: subtotal.cents(),
            discount_cents,
            surcharge_cents,
            total_cents: total.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: i64, qty: i64) -> PricedLine {
        PricedLine {
            product_id: id.to_string(),
            name: id.to_string(),
            unit_price_cents: price,
            quantity: qty,
        }
    }

    #[test]
    fn test_normalize_rejects_empty_cart() {
        assert!(matches!(normalize_cart(&[]), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_normalize_rejects_bad_quantities() {
        let zero = vec![CartItem::new("P1", 0)];
        assert!(matches!(
            normalize_cart(&zero),
            Err(CoreError::InvalidQuantity { .. })
        ));

        let negative = vec![CartItem::new("P1", -2)];
        assert!(matches!(
            normalize_cart(&negative),
            Err(CoreError::InvalidQuantity { .. })
        ));

        let too_many = vec![CartItem::new("P1", MAX_ITEM_QUANTITY + 1)];
        assert!(matches!(
            normalize_cart(&too_many),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_normalize_merges_duplicates_preserving_order() {
        let cart = vec![
            CartItem::new("P1", 2),
            CartItem::new("P2", 1),
            CartItem::new("P1", 3),
        ];
        let merged = normalize_cart(&cart).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], CartItem::new("P1", 5));
        assert_eq!(merged[1], CartItem::new("P2", 1));
    }

    #[test]
    fn test_normalize_rejects_merged_overflow() {
        let cart = vec![
            CartItem::new("P1", MAX_ITEM_QUANTITY),
            CartItem::new("P1", 1),
        ];
        assert!(matches!(
            normalize_cart(&cart),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_totals_basic() {
        // Scenario: 2 × R$10.00 + 1 × R$5.00, discount R$5.00 → R$20.00
        let lines = vec![line("P1", 1000, 2), line("P2", 500, 1)];
        let totals = SaleTotals::compute(&lines, 500, 0).unwrap();
        assert_eq!(totals.subtotal_cents, 2500);
        assert_eq!(totals.total_cents, 2000);
    }

    #[test]
    fn test_totals_with_surcharge() {
        let lines = vec![line("P1", 1000, 1)];
        let totals = SaleTotals::compute(&lines, 0, 250).unwrap();
        assert_eq!(totals.total_cents, 1250);
    }

    #[test]
    fn test_totals_rejects_discount_beyond_order() {
        // subtotal 10.00, discount 20.00 → reject, never clamp
        let lines = vec![line("P1", 1000, 1)];
        let err = SaleTotals::compute(&lines, 2000, 0).unwrap_err();
        assert!(matches!(err, CoreError::NegativeTotal { .. }));
    }

    #[test]
    fn test_totals_surcharge_can_rescue_large_discount() {
        // pre-clamp total = 1000 - 1500 + 600 = 100 → accepted;
        // committed total = max(0, -500) + 600 = 600
        let lines = vec![line("P1", 1000, 1)];
        let totals = SaleTotals::compute(&lines, 1500, 600).unwrap();
        assert_eq!(totals.total_cents, 600);
    }
}
