use crate::domain::audit::AuditEntry;
use crate::domain::customer::Customer;
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::ports::{
    AuditLog, CatalogStore, CustomerDirectory, OrderStore, ProductRow, QuoteStore,
};
use crate::domain::product::{Product, ProductId};
use crate::domain::quote::{
    CustomerResponse, NewTailoringRequest, QuoteId, QuoteStatus, TailoringRequest,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// One catalog row. Each product lives behind its own mutex so checkout can
/// hold an exclusive row lock without freezing the rest of the catalog.
type Slot = Arc<Mutex<Option<Product>>>;

/// A thread-safe in-memory catalog with per-product row locks.
///
/// `lock_for_update` is the select-for-update primitive: the returned guard
/// keeps the row's mutex until dropped, so concurrent checkouts touching the
/// same product wait for each other. Ideal for tests and the replay binary.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    rows: Arc<RwLock<BTreeMap<ProductId, Slot>>>,
}

struct InMemoryProductRow {
    guard: OwnedMutexGuard<Option<Product>>,
}

#[async_trait]
impl ProductRow for InMemoryProductRow {
    fn product(&self) -> Option<&Product> {
        self.guard.as_ref()
    }

    async fn save(&mut self, product: Product) -> Result<()> {
        *self.guard = Some(product);
        Ok(())
    }
}

impl InMemoryCatalog {
    /// Creates a new, empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches a row slot, creating an empty one for ids not seen before so
    /// every caller locks the same mutex for a given product.
    async fn slot(&self, id: ProductId) -> Slot {
        {
            let rows = self.rows.read().await;
            if let Some(slot) = rows.get(&id) {
                return slot.clone();
            }
        }
        let mut rows = self.rows.write().await;
        rows.entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn insert(&self, product: Product) -> Result<()> {
        let slot = self.slot(product.id).await;
        let mut row = slot.lock().await;
        *row = Some(product);
        Ok(())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        let slot = self.slot(id).await;
        let row = slot.lock().await;
        Ok(row.clone())
    }

    async fn lock_for_update(&self, id: ProductId) -> Result<Box<dyn ProductRow>> {
        let slot = self.slot(id).await;
        let guard = slot.lock_owned().await;
        Ok(Box::new(InMemoryProductRow { guard }))
    }

    async fn save(&self, product: Product) -> Result<()> {
        self.insert(product).await
    }

    async fn all(&self) -> Result<Vec<Product>> {
        let slots: Vec<Slot> = {
            let rows = self.rows.read().await;
            rows.values().cloned().collect()
        };
        let mut products = Vec::with_capacity(slots.len());
        for slot in slots {
            let row = slot.lock().await;
            if let Some(product) = row.clone() {
                products.push(product);
            }
        }
        Ok(products)
    }
}

/// A thread-safe in-memory order store. Ids are assigned sequentially;
/// `save_all` holds the table lock for the whole batch so the cascade
/// rejection is visible all-or-nothing.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, customer_name: &str, email: &str, address: &str) -> Result<Order> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order = Order {
            id,
            customer_name: customer_name.to_string(),
            email: email.to_string(),
            address: address.to_string(),
            created_at: Utc::now(),
            status: OrderStatus::Pending,
            total: Money::ZERO,
            rejection_reason: None,
            lines: Vec::new(),
        };
        let mut orders = self.orders.write().await;
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn save(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn save_all(&self, batch: Vec<Order>) -> Result<()> {
        let mut orders = self.orders.write().await;
        for order in batch {
            orders.insert(order.id, order);
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().cloned().collect())
    }

    async fn open_orders_containing(&self, product: ProductId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.status.is_open() && o.contains_product(product))
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for tailoring requests.
#[derive(Default, Clone)]
pub struct InMemoryQuoteStore {
    requests: Arc<RwLock<BTreeMap<QuoteId, TailoringRequest>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryQuoteStore {
    /// Creates a new, empty in-memory quote store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn create(&self, request: NewTailoringRequest) -> Result<TailoringRequest> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let request = TailoringRequest {
            id,
            customer: request.customer,
            name: request.name,
            email: request.email,
            phone: request.phone,
            garment: request.garment,
            description: request.description,
            created_at: Utc::now(),
            status: QuoteStatus::Pending,
            admin_notes: String::new(),
            quoted_amount: None,
            response: CustomerResponse::Undecided,
        };
        let mut requests = self.requests.write().await;
        requests.insert(id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: QuoteId) -> Result<Option<TailoringRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn save(&self, request: TailoringRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id, request);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<TailoringRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.values().cloned().collect())
    }
}

/// A thread-safe in-memory append-only audit log. Entries keep insertion
/// order; there is no mutation surface at all.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    /// Creates a new, empty in-memory audit log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, name: &str, email: &str, action: &str) -> Result<()> {
        let entry = AuditEntry {
            name: name.to_string(),
            email: email.to_string(),
            action: action.to_string(),
            at: Utc::now(),
        };
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.clone())
    }

    async fn entries_for(&self, name: &str) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| e.name == name).cloned().collect())
    }
}

/// A thread-safe in-memory customer directory keyed by username.
#[derive(Default, Clone)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<BTreeMap<String, Customer>>>,
}

impl InMemoryCustomerDirectory {
    /// Creates a new, empty in-memory directory.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn get(&self, username: &str) -> Result<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.get(username).cloned())
    }

    async fn upsert(&self, customer: Customer) -> Result<()> {
        let mut customers = self.customers.write().await;
        customers.insert(customer.username.clone(), customer);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn hoodie() -> Product {
        Product::new(1, "Hoodie", Money::new(dec!(25.00)).unwrap(), 10)
    }

    #[tokio::test]
    async fn test_catalog_insert_and_get() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(hoodie()).await.unwrap();

        let found = catalog.get(1).await.unwrap().unwrap();
        assert_eq!(found.name, "Hoodie");
        assert!(catalog.get(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_row_lock_serializes_writers() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(hoodie()).await.unwrap();

        let row = catalog.lock_for_update(1).await.unwrap();
        assert_eq!(row.product().unwrap().stock, 10);

        // a second locker must wait until the first guard drops
        let second = tokio::time::timeout(Duration::from_millis(50), catalog.lock_for_update(1));
        assert!(second.await.is_err());

        drop(row);
        let row = tokio::time::timeout(Duration::from_millis(50), catalog.lock_for_update(1))
            .await
            .expect("lock should be free again")
            .unwrap();
        assert_eq!(row.product().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_row_save_writes_through() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(hoodie()).await.unwrap();

        let mut row = catalog.lock_for_update(1).await.unwrap();
        let mut updated = row.product().unwrap().clone();
        updated.stock = 7;
        row.save(updated).await.unwrap();
        drop(row);

        assert_eq!(catalog.get(1).await.unwrap().unwrap().stock, 7);
    }

    #[tokio::test]
    async fn test_locking_a_missing_product_yields_empty_row() {
        let catalog = InMemoryCatalog::new();
        let row = catalog.lock_for_update(42).await.unwrap();
        assert!(row.product().is_none());
    }

    #[tokio::test]
    async fn test_order_ids_are_sequential() {
        let store = InMemoryOrderStore::new();
        let first = store
            .create("alice", "alice@example.com", "12 Main St")
            .await
            .unwrap();
        let second = store
            .create("bob", "bob@example.com", "9 Side St")
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(first.total, Money::ZERO);
    }

    #[tokio::test]
    async fn test_open_orders_containing_filters_status_and_product() {
        let store = InMemoryOrderStore::new();
        let product = hoodie();

        let mut open = store
            .create("alice", "alice@example.com", "12 Main St")
            .await
            .unwrap();
        open.add_line(&product, 1);
        store.save(open.clone()).await.unwrap();

        let mut closed = store
            .create("bob", "bob@example.com", "9 Side St")
            .await
            .unwrap();
        closed.add_line(&product, 2);
        closed.status = OrderStatus::Finalized;
        store.save(closed).await.unwrap();

        let matches = store.open_orders_containing(product.id).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, open.id);
    }

    #[tokio::test]
    async fn test_audit_log_keeps_insertion_order() {
        let log = InMemoryAuditLog::new();
        log.record("alice", "alice@example.com", "blocked")
            .await
            .unwrap();
        log.record("bob", "bob@example.com", "order 1 -> rejected")
            .await
            .unwrap();
        log.record("alice", "alice@example.com", "unblocked")
            .await
            .unwrap();

        let all = log.entries().await.unwrap();
        assert_eq!(all.len(), 3);

        let alice: Vec<String> = log
            .entries_for("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(alice, vec!["blocked".to_string(), "unblocked".to_string()]);
    }

    #[tokio::test]
    async fn test_quote_store_assigns_workflow_defaults() {
        use crate::domain::quote::GarmentKind;

        let store = InMemoryQuoteStore::new();
        let created = store
            .create(NewTailoringRequest {
                customer: None,
                name: "Alice".into(),
                email: "alice@example.com".into(),
                phone: "+1 555 0100".into(),
                garment: GarmentKind::Shirt,
                description: "monogrammed cuffs".into(),
            })
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.status, QuoteStatus::Pending);
        assert_eq!(created.response, CustomerResponse::Undecided);
        assert!(created.quoted_amount.is_none());
    }
}
