use tracing::info;

use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::ports::{AuditLogBox, CatalogStoreBox, OrderStoreBox};
use crate::domain::product::ProductId;
use crate::error::{CommerceError, Result};

const DEFAULT_REJECTION_REASON: &str = "no reason given";
const DISCONTINUED_REASON: &str = "product discontinued";

/// Admin-side order lifecycle: status transitions and the discontinuation
/// cascade. Every transition leaves one audit entry.
pub struct OrderDesk {
    orders: OrderStoreBox,
    catalog: CatalogStoreBox,
    audit: AuditLogBox,
}

impl OrderDesk {
    pub fn new(orders: OrderStoreBox, catalog: CatalogStoreBox, audit: AuditLogBox) -> Self {
        Self {
            orders,
            catalog,
            audit,
        }
    }

    /// Moves an order to `target`. Rejection takes an optional reason,
    /// defaulting when blank; re-rejecting an already rejected order
    /// overwrites the reason and is logged as a reason update rather than a
    /// fresh transition.
    pub async fn set_status(
        &self,
        id: OrderId,
        target: OrderStatus,
        reason: Option<&str>,
    ) -> Result<Order> {
        let mut order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("order {id}")))?;

        let previous = order.status;
        if !previous.can_transition_to(target) {
            return Err(CommerceError::validation(format!(
                "order {id} cannot move from {previous} to {target}"
            )));
        }

        order.status = target;
        if target == OrderStatus::Rejected {
            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_REJECTION_REASON);
            order.rejection_reason = Some(reason.to_string());
        } else {
            order.rejection_reason = None;
        }
        self.orders.save(order.clone()).await?;

        let action = if previous == OrderStatus::Rejected && target == OrderStatus::Rejected {
            format!("order {id}: rejected (reason updated)")
        } else {
            format!("order {id}: {previous} -> {target}")
        };
        self.audit
            .record(&order.customer_name, &order.email, &action)
            .await?;
        info!(order = id, from = %previous, to = %target, "order status changed");

        Ok(order)
    }

    /// Deactivates a product and force-rejects every open order containing
    /// it, as one atomic batch. Finalized and rejected orders are untouched.
    pub async fn discontinue_product(&self, product: ProductId) -> Result<Vec<OrderId>> {
        let mut row = self.catalog.lock_for_update(product).await?;
        let Some(current) = row.product() else {
            return Err(CommerceError::not_found(format!("product {product}")));
        };
        let mut updated = current.clone();
        updated.active = false;
        row.save(updated).await?;

        let mut rejected = Vec::new();
        let mut batch = Vec::new();
        let mut audit_rows = Vec::new();
        for mut order in self.orders.open_orders_containing(product).await? {
            audit_rows.push((
                order.customer_name.clone(),
                order.email.clone(),
                format!(
                    "order {}: {} -> rejected ({DISCONTINUED_REASON})",
                    order.id, order.status
                ),
            ));
            order.status = OrderStatus::Rejected;
            order.rejection_reason = Some(DISCONTINUED_REASON.to_string());
            rejected.push(order.id);
            batch.push(order);
        }
        if batch.is_empty() {
            return Ok(rejected);
        }

        self.orders.save_all(batch).await?;
        for (name, email, action) in &audit_rows {
            self.audit.record(name, email, action).await?;
        }
        info!(product, orders = rejected.len(), "product discontinued");

        Ok(rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::Cart;
    use crate::domain::customer::Customer;
    use crate::domain::money::Money;
    use crate::domain::ports::{AuditLog, CatalogStore, OrderStore};
    use crate::domain::product::Product;
    use crate::infrastructure::in_memory::{
        InMemoryAuditLog, InMemoryCatalog, InMemoryOrderStore,
    };
    use rust_decimal_macros::dec;

    struct Fixture {
        desk: OrderDesk,
        orders: InMemoryOrderStore,
        catalog: InMemoryCatalog,
        audit: InMemoryAuditLog,
    }

    fn fixture() -> Fixture {
        let orders = InMemoryOrderStore::new();
        let catalog = InMemoryCatalog::new();
        let audit = InMemoryAuditLog::new();
        let desk = OrderDesk::new(
            Box::new(orders.clone()),
            Box::new(catalog.clone()),
            Box::new(audit.clone()),
        );
        Fixture {
            desk,
            orders,
            catalog,
            audit,
        }
    }

    async fn place_order(f: &Fixture, customer: &str, product: ProductId) -> Order {
        use crate::application::checkout::CheckoutEngine;
        let engine = CheckoutEngine::new(
            Box::new(f.catalog.clone()),
            Box::new(f.orders.clone()),
            Box::new(f.audit.clone()),
        );
        let mut cart = Cart::new();
        cart.add(product, 1);
        let customer = Customer::new(customer, format!("{customer}@example.com"));
        engine.checkout(&customer, cart).await.unwrap().order
    }

    #[tokio::test]
    async fn test_transition_and_audit() {
        let f = fixture();
        f.catalog
            .insert(Product::new(1, "Hoodie", Money::new(dec!(25.00)).unwrap(), 5))
            .await
            .unwrap();
        let order = place_order(&f, "alice", 1).await;

        let updated = f
            .desk
            .set_status(order.id, OrderStatus::InProcess, None)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::InProcess);

        let entries = f.audit.entries_for("alice").await.unwrap();
        assert!(
            entries
                .iter()
                .any(|e| e.action == format!("order {}: pending -> in_process", order.id))
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_order_untouched() {
        let f = fixture();
        f.catalog
            .insert(Product::new(1, "Hoodie", Money::new(dec!(25.00)).unwrap(), 5))
            .await
            .unwrap();
        let order = place_order(&f, "alice", 1).await;

        let err = f
            .desk
            .set_status(order.id, OrderStatus::Finalized, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));

        let stored = f.orders.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_reject_defaults_reason_and_rereject_updates_it() {
        let f = fixture();
        f.catalog
            .insert(Product::new(1, "Hoodie", Money::new(dec!(25.00)).unwrap(), 5))
            .await
            .unwrap();
        let order = place_order(&f, "alice", 1).await;

        let rejected = f
            .desk
            .set_status(order.id, OrderStatus::Rejected, Some("  "))
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("no reason given"));

        let rerejected = f
            .desk
            .set_status(order.id, OrderStatus::Rejected, Some("out of fabric"))
            .await
            .unwrap();
        assert_eq!(
            rerejected.rejection_reason.as_deref(),
            Some("out of fabric")
        );

        let entries = f.audit.entries_for("alice").await.unwrap();
        assert!(
            entries
                .iter()
                .any(|e| e.action == format!("order {}: rejected (reason updated)", order.id))
        );
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let f = fixture();
        let err = f
            .desk
            .set_status(99, OrderStatus::InProcess, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_discontinuation_cascade() {
        let f = fixture();
        f.catalog
            .insert(Product::new(1, "Hoodie", Money::new(dec!(25.00)).unwrap(), 10))
            .await
            .unwrap();
        f.catalog
            .insert(Product::new(2, "Shirt", Money::new(dec!(10.00)).unwrap(), 10))
            .await
            .unwrap();

        let pending = place_order(&f, "alice", 1).await;
        let in_process = place_order(&f, "bob", 1).await;
        f.desk
            .set_status(in_process.id, OrderStatus::InProcess, None)
            .await
            .unwrap();
        let finalized = place_order(&f, "carol", 1).await;
        f.desk
            .set_status(finalized.id, OrderStatus::InProcess, None)
            .await
            .unwrap();
        f.desk
            .set_status(finalized.id, OrderStatus::Finalized, None)
            .await
            .unwrap();
        let unrelated = place_order(&f, "dave", 2).await;

        let rejected = f.desk.discontinue_product(1).await.unwrap();
        assert_eq!(rejected.len(), 2);

        let pending = f.orders.get(pending.id).await.unwrap().unwrap();
        assert_eq!(pending.status, OrderStatus::Rejected);
        assert_eq!(
            pending.rejection_reason.as_deref(),
            Some("product discontinued")
        );

        let in_process = f.orders.get(in_process.id).await.unwrap().unwrap();
        assert_eq!(in_process.status, OrderStatus::Rejected);

        let finalized = f.orders.get(finalized.id).await.unwrap().unwrap();
        assert_eq!(finalized.status, OrderStatus::Finalized);

        let unrelated = f.orders.get(unrelated.id).await.unwrap().unwrap();
        assert_eq!(unrelated.status, OrderStatus::Pending);

        assert!(!f.catalog.get(1).await.unwrap().unwrap().active);

        let entries = f.audit.entries().await.unwrap();
        let cascade: Vec<_> = entries
            .iter()
            .filter(|e| e.action.contains("product discontinued"))
            .collect();
        assert_eq!(cascade.len(), 2);
    }

    #[tokio::test]
    async fn test_discontinue_unknown_product() {
        let f = fixture();
        let err = f.desk.discontinue_product(42).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }
}
