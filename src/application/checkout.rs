use tracing::{debug, info};

use crate::domain::cart::Cart;
use crate::domain::customer::Customer;
use crate::domain::order::Order;
use crate::domain::ports::{AuditLogBox, CatalogStoreBox, OrderStoreBox, ProductRow};
use crate::domain::product::Product;
use crate::error::{CommerceError, LineFailure, LineFailureReason, Result, StockReport};

/// The outcome of a successful checkout: the persisted order and the cart,
/// returned cleared so the caller can store it back into the session.
#[derive(Debug)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub cart: Cart,
}

/// Converts a cart into a durable order while reserving inventory.
///
/// All stock checks and decrements happen while every affected product row is
/// exclusively locked, so two checkouts competing for the same product
/// serialize and the loser sees the post-decrement stock. Any failing line
/// aborts the whole attempt with no mutation.
pub struct CheckoutEngine {
    catalog: CatalogStoreBox,
    orders: OrderStoreBox,
    audit: AuditLogBox,
}

impl CheckoutEngine {
    pub fn new(catalog: CatalogStoreBox, orders: OrderStoreBox, audit: AuditLogBox) -> Self {
        Self {
            catalog,
            orders,
            audit,
        }
    }

    pub async fn checkout(&self, customer: &Customer, cart: Cart) -> Result<CheckoutReceipt> {
        if customer.blocked {
            return Err(CommerceError::conflict(
                "account is blocked and cannot place orders",
            ));
        }
        if cart.is_empty() {
            return Err(CommerceError::validation("cart is empty"));
        }

        // Lock every row before validating anything. Cart entries iterate in
        // ascending product id, so competing checkouts acquire locks in the
        // same order.
        let mut failures: Vec<LineFailure> = Vec::new();
        let mut picks: Vec<(u32, Product, Box<dyn ProductRow>)> = Vec::new();
        for (product_id, quantity) in cart.entries() {
            let row = self.catalog.lock_for_update(product_id).await?;
            match row.product() {
                None => failures.push(LineFailure {
                    product: format!("product #{product_id}"),
                    reason: LineFailureReason::Unavailable,
                }),
                Some(p) if !p.active => failures.push(LineFailure {
                    product: p.name.clone(),
                    reason: LineFailureReason::Unavailable,
                }),
                Some(p) if p.stock < quantity => failures.push(LineFailure {
                    product: p.name.clone(),
                    reason: LineFailureReason::InsufficientStock {
                        available: p.stock,
                        requested: quantity,
                    },
                }),
                Some(p) => {
                    let snapshot = p.clone();
                    picks.push((quantity, snapshot, row));
                }
            }
        }

        // All-or-nothing: a single failing line rejects the whole cart. The
        // row locks drop here with nothing written.
        if !failures.is_empty() {
            debug!(customer = %customer.username, lines = failures.len(), "checkout rejected");
            return Err(CommerceError::OutOfStock(StockReport(failures)));
        }

        let mut order = self
            .orders
            .create(&customer.username, &customer.email, customer.shipping_address())
            .await?;

        for (quantity, product, row) in &mut picks {
            order.add_line(product, *quantity);
            let mut updated = product.clone();
            updated.stock -= *quantity;
            row.save(updated).await?;
        }

        self.orders.save(order.clone()).await?;
        self.audit
            .record(
                &customer.username,
                &customer.email,
                &format!("order {} placed", order.id),
            )
            .await?;
        info!(order = order.id, customer = %customer.username, total = %order.total.value(), "order placed");

        let mut cart = cart;
        cart.clear();
        Ok(CheckoutReceipt { order, cart })
    }
}
