//! Session-owned shopping cart.
//!
//! The cart collaborator: an ordered list of product references with
//! quantities, stored in the tower-session. Prices are never stored here;
//! they are resolved against the catalog snapshot whenever a cart is read,
//! so a price change in the catalog is reflected immediately.

use serde::{Deserialize, Serialize};

use lumine_core::ProductId;
use lumine_core::catalog::Product;
use lumine_core::checkout::CartLine;

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    items: Vec<CartItem>,
}

impl SessionCart {
    /// Add a product, merging quantities if it is already present.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
            });
        }
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
        } else if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Remove a line entirely.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Empty the cart. Called on successful order placement.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The cart entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of pieces across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Resolve the cart against a catalog snapshot into priced lines.
    ///
    /// Entries whose product no longer exists in the catalog are dropped
    /// rather than priced at zero.
    #[must_use]
    pub fn lines(&self, products: &[Product]) -> Vec<CartLine> {
        self.items
            .iter()
            .filter_map(|item| {
                products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|product| CartLine {
                        product_id: item.product_id,
                        unit_price: product.base_price,
                        quantity: item.quantity,
                    })
            })
            .collect()
    }
}
