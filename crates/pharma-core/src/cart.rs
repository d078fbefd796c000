//! # Cart
//!
//! The sale being assembled at the counter.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Method                  Cart Change           │
//! │  ───────────────          ──────                  ───────────           │
//! │                                                                         │
//! │  Scan / pick ────────────► add() ───────────────► +1 or new line       │
//! │                                                                         │
//! │  ArrowUp / ArrowDown ────► adjust(id, ±1) ──────► qty ± 1, 0 removes   │
//! │                                                                         │
//! │  Set discount ───────────► set_discount() ──────► 0..=100 %            │
//! │                                                                         │
//! │  Delete ─────────────────► remove() ────────────► line gone            │
//! │                                                                         │
//! │  Confirm / cancel ───────► clear() ─────────────► empty                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! line  = PPV × q × (1 − d/100)
//! total = Σ line
//! count = Σ q
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Medicine, MedicineId};
use crate::validation::validate_discount_percent;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// The medicine is a frozen copy taken when the line was created, so the
/// price shown stays stable even if the catalog is refreshed mid-sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub medicine: Medicine,
    pub quantity: i64,
    /// Discount in percent, 0..=100.
    #[serde(default)]
    pub discount_percent: u32,
}

impl CartItem {
    /// Creates a line with quantity 1 and no discount.
    pub fn new(medicine: &Medicine) -> Self {
        CartItem {
            medicine: medicine.clone(),
            quantity: 1,
            discount_percent: 0,
        }
    }

    pub fn medicine_id(&self) -> MedicineId {
        self.medicine.id
    }

    /// PPV × quantity, before discount.
    pub fn gross_total(&self) -> Money {
        self.medicine.ppv.multiply_quantity(self.quantity)
    }

    /// Line total after the discount.
    ///
    /// ## Example
    /// ```text
    /// PPV 40.00 × 3 = 120.00, discount 10 % → 108.00
    /// ```
    pub fn line_total(&self) -> Money {
        self.gross_total()
            .apply_percentage_discount(self.discount_percent * 100)
    }

    /// Amount taken off by the discount.
    pub fn discount_amount(&self) -> Money {
        self.gross_total() - self.line_total()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart.
///
/// ## Invariants
/// - Lines are unique by medicine id (adding again increments)
/// - Every line has quantity >= 1 (reaching 0 removes the line)
/// - At most MAX_CART_ITEMS lines, MAX_ITEM_QUANTITY per line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds one unit of a medicine.
    ///
    /// ## Behavior
    /// - Already in cart (same id): quantity + 1
    /// - Otherwise: new line with quantity 1
    ///
    /// ## Returns
    /// The line's quantity after the call.
    pub fn add(&mut self, medicine: &Medicine) -> CoreResult<i64> {
        if let Some(item) = self.items.iter_mut().find(|i| i.medicine.id == medicine.id) {
            let new_qty = item.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(new_qty);
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::new(medicine));
        Ok(1)
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// The result is clamped at 0; a line reaching 0 is removed.
    ///
    /// ## Returns
    /// The line's quantity after the call (0 when removed).
    pub fn adjust(&mut self, id: MedicineId, delta: i64) -> CoreResult<i64> {
        let item = self
            .items
            .iter()
            .find(|i| i.medicine.id == id)
            .ok_or(CoreError::NotInCart(id))?;

        let new_qty = (item.quantity + delta).max(0);
        self.set_quantity(id, new_qty)?;
        Ok(new_qty)
    }

    /// Sets a line's quantity; 0 removes the line.
    pub fn set_quantity(&mut self, id: MedicineId, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove(id).map(|_| ());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.medicine.id == id)
            .ok_or(CoreError::NotInCart(id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Sets a line's discount percentage (0..=100).
    pub fn set_discount(&mut self, id: MedicineId, percent: u32) -> CoreResult<()> {
        validate_discount_percent(percent)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.medicine.id == id)
            .ok_or(CoreError::NotInCart(id))?;
        item.discount_percent = percent;
        Ok(())
    }

    /// Removes a line by medicine id.
    pub fn remove(&mut self, id: MedicineId) -> CoreResult<CartItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.medicine.id == id)
            .ok_or(CoreError::NotInCart(id))?;
        Ok(self.items.remove(index))
    }

    /// Id of the most recently added line (target of the arrow keys).
    pub fn last_id(&self) -> Option<MedicineId> {
        self.items.last().map(|i| i.medicine.id)
    }

    /// Line for a medicine id.
    pub fn get(&self, id: MedicineId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.medicine.id == id)
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total number of articles (Σ quantity).
    pub fn article_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of PPV × quantity before discounts.
    pub fn gross_total(&self) -> Money {
        self.items.iter().map(CartItem::gross_total).sum()
    }

    /// Sum of all line discounts.
    pub fn discount_total(&self) -> Money {
        self.items.iter().map(CartItem::discount_amount).sum()
    }

    /// Amount to collect.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Totals summary shown under the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub article_count: i64,
    pub gross: Money,
    pub discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            article_count: cart.article_count(),
            gross: cart.gross_total(),
            discount: cart.discount_total(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::medicine;

    #[test]
    fn test_add_new_then_increment() {
        let mut cart = Cart::new();
        let doliprane = medicine(1, "611000001", "DOLIPRANE 500", 1560);

        assert_eq!(cart.add(&doliprane).unwrap(), 1);
        assert_eq!(cart.add(&doliprane).unwrap(), 2);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.article_count(), 2);
    }

    #[test]
    fn test_lines_keyed_by_id_not_code() {
        let mut cart = Cart::new();
        let batch_a = medicine(1, "611000001", "DOLIPRANE 500", 1560);
        let batch_b = medicine(2, "611000001", "DOLIPRANE 500", 1560);

        cart.add(&batch_a).unwrap();
        cart.add(&batch_b).unwrap();

        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_totals_with_discounts() {
        let mut cart = Cart::new();
        let a = medicine(1, "A", "A", 4000); // 40.00
        let b = medicine(2, "B", "B", 1250); // 12.50

        for _ in 0..3 {
            cart.add(&a).unwrap();
        }
        cart.add(&b).unwrap();
        cart.add(&b).unwrap();
        cart.set_discount(1, 10).unwrap();

        // a: 40.00 × 3 × 0.9 = 108.00, b: 12.50 × 2 = 25.00
        assert_eq!(cart.total().cents(), 13300);
        assert_eq!(cart.gross_total().cents(), 14500);
        assert_eq!(cart.discount_total().cents(), 1200);
        assert_eq!(cart.article_count(), 5);
    }

    #[test]
    fn test_removing_item_removes_exactly_its_contribution() {
        let mut cart = Cart::new();
        let a = medicine(1, "A", "A", 4000);
        let b = medicine(2, "B", "B", 1250);
        cart.add(&a).unwrap();
        cart.add(&b).unwrap();
        cart.set_discount(2, 20).unwrap();

        let before = cart.total();
        let removed = cart.remove(2).unwrap();

        assert_eq!(cart.total(), before - removed.line_total());
        assert_eq!(cart.article_count(), 1);
    }

    #[test]
    fn test_full_discount_makes_line_free() {
        let mut cart = Cart::new();
        cart.add(&medicine(1, "A", "A", 999)).unwrap();
        cart.set_discount(1, 100).unwrap();
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_discount_out_of_range_rejected() {
        let mut cart = Cart::new();
        cart.add(&medicine(1, "A", "A", 999)).unwrap();
        assert!(matches!(
            cart.set_discount(1, 101),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(cart.get(1).unwrap().discount_percent, 0);
    }

    #[test]
    fn test_adjust_clamps_and_removes_at_zero() {
        let mut cart = Cart::new();
        cart.add(&medicine(1, "A", "A", 999)).unwrap();

        assert_eq!(cart.adjust(1, 2).unwrap(), 3);
        assert_eq!(cart.adjust(1, -10).unwrap(), 0);
        assert!(cart.is_empty());
        assert!(matches!(cart.adjust(1, 1), Err(CoreError::NotInCart(1))));
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        cart.add(&medicine(1, "A", "A", 100)).unwrap();
        cart.set_quantity(1, MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add(&medicine(1, "A", "A", 100)),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_last_id_follows_insertion_order() {
        let mut cart = Cart::new();
        assert_eq!(cart.last_id(), None);
        cart.add(&medicine(7, "A", "A", 100)).unwrap();
        cart.add(&medicine(3, "B", "B", 100)).unwrap();
        cart.add(&medicine(7, "A", "A", 100)).unwrap();
        assert_eq!(cart.last_id(), Some(3));
    }

    #[test]
    fn test_totals_summary() {
        let mut cart = Cart::new();
        cart.add(&medicine(1, "A", "A", 1000)).unwrap();
        cart.adjust(1, 1).unwrap();

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.line_count, 1);
        assert_eq!(totals.article_count, 2);
        assert_eq!(totals.total.cents(), 2000);
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_discount() {
        let mut cart = Cart::new();
        cart.add(&medicine(1, "A", "A", 1000)).unwrap();
        cart.set_discount(1, 15).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
