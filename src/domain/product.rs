use serde::{Deserialize, Serialize};

use super::money::Money;

pub type ProductId = u64;

/// A catalog product. Stock is a plain count decremented only by checkout;
/// `active` is the soft-delete flag. Products referenced by an order are
/// never removed, only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub active: bool,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock,
            active: true,
        }
    }
}
