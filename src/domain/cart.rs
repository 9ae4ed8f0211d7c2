use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::product::ProductId;

/// A shopping cart: product id to requested quantity.
///
/// This is pure data scoped to one customer session. No business rules are
/// enforced here; availability and stock are checked by the checkout engine.
/// Entries iterate in ascending product id, which is also the order in which
/// checkout acquires row locks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: BTreeMap<ProductId, u32>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of a product, merging with any existing entry.
    /// Quantities below 1 are bumped to 1.
    pub fn add(&mut self, product: ProductId, quantity: u32) {
        let quantity = quantity.max(1);
        *self.items.entry(product).or_insert(0) += quantity;
    }

    /// Replaces a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product: ProductId, quantity: u32) {
        if quantity == 0 {
            self.items.remove(&product);
        } else {
            self.items.insert(product, quantity);
        }
    }

    pub fn remove(&mut self, product: ProductId) {
        self.items.remove(&product);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct product lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total unit count across all lines, for badge display.
    pub fn unit_count(&self) -> u32 {
        self.items.values().sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.items.iter().map(|(id, qty)| (*id, *qty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_and_clamps() {
        let mut cart = Cart::new();
        cart.add(3, 2);
        cart.add(3, 1);
        cart.add(5, 0); // clamped to 1
        assert_eq!(cart.entries().collect::<Vec<_>>(), vec![(3, 3), (5, 1)]);
        assert_eq!(cart.unit_count(), 4);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(1, 2);
        cart.set_quantity(1, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_entries_are_ordered_by_product_id() {
        let mut cart = Cart::new();
        cart.add(9, 1);
        cart.add(2, 1);
        cart.add(5, 1);
        let ids: Vec<ProductId> = cart.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }
}
