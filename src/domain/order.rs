use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::product::{Product, ProductId};
use crate::error::CommerceError;

pub type OrderId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProcess,
    Finalized,
    Rejected,
}

impl OrderStatus {
    /// The allowed-transition table. Orders move strictly forward; rejection
    /// is reachable from any non-finalized state, and a rejected order may be
    /// re-rejected to overwrite its reason.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, InProcess)
                | (Pending, Rejected)
                | (InProcess, Finalized)
                | (InProcess, Rejected)
                | (Rejected, Rejected)
        )
    }

    /// Open orders are the ones a product discontinuation still affects.
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::InProcess)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProcess => "in_process",
            OrderStatus::Finalized => "finalized",
            OrderStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "in_process" => Ok(OrderStatus::InProcess),
            "finalized" => Ok(OrderStatus::Finalized),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(CommerceError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// One order line, frozen at checkout time. The subtotal is unit price times
/// quantity as seen under the row lock and is never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub subtotal: Money,
}

/// A customer order. Owns its lines; `total` equals the sum of line subtotals
/// at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub email: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Money,
    pub rejection_reason: Option<String>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Appends a line for `quantity` units of `product` and accumulates the
    /// total.
    pub fn add_line(&mut self, product: &Product, quantity: u32) {
        let subtotal = product.price.times(quantity);
        self.lines.push(OrderLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            subtotal,
        });
        self.total += subtotal;
    }

    pub fn contains_product(&self, product: ProductId) -> bool {
        self.lines.iter().any(|line| line.product_id == product)
    }
}
