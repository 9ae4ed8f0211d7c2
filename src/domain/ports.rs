use async_trait::async_trait;

use super::audit::AuditEntry;
use super::customer::Customer;
use super::order::{Order, OrderId};
use super::product::{Product, ProductId};
use super::quote::{NewTailoringRequest, QuoteId, TailoringRequest};
use crate::error::Result;

pub type CatalogStoreBox = Box<dyn CatalogStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type QuoteStoreBox = Box<dyn QuoteStore>;
pub type AuditLogBox = Box<dyn AuditLog>;
pub type CustomerDirectoryBox = Box<dyn CustomerDirectory>;

/// An exclusively locked product row. The lock is held for the lifetime of
/// the value and released on drop; writes go through `save` so they stay
/// serialized with concurrent lockers of the same row.
#[async_trait]
pub trait ProductRow: Send {
    /// The row as seen under the lock. `None` when the cart references a
    /// product that no longer exists.
    fn product(&self) -> Option<&Product>;
    async fn save(&mut self, product: Product) -> Result<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert(&self, product: Product) -> Result<()>;
    async fn get(&self, id: ProductId) -> Result<Option<Product>>;
    /// Select-for-update: blocks until any concurrent holder of the same row
    /// releases it.
    async fn lock_for_update(&self, id: ProductId) -> Result<Box<dyn ProductRow>>;
    async fn save(&self, product: Product) -> Result<()>;
    async fn all(&self) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates a pending order header with a zero total; the store assigns
    /// the id and creation timestamp.
    async fn create(&self, customer_name: &str, email: &str, address: &str) -> Result<Order>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
    /// Last write wins; concurrent admin edits of the same order are not
    /// version-checked.
    async fn save(&self, order: Order) -> Result<()>;
    /// Persists the batch atomically: either every order is written or none.
    async fn save_all(&self, orders: Vec<Order>) -> Result<()>;
    async fn all(&self) -> Result<Vec<Order>>;
    async fn open_orders_containing(&self, product: ProductId) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn create(&self, request: NewTailoringRequest) -> Result<TailoringRequest>;
    async fn get(&self, id: QuoteId) -> Result<Option<TailoringRequest>>;
    async fn save(&self, request: TailoringRequest) -> Result<()>;
    async fn all(&self) -> Result<Vec<TailoringRequest>>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends one entry with a server timestamp. There is no update or
    /// delete surface.
    async fn record(&self, name: &str, email: &str, action: &str) -> Result<()>;
    async fn entries(&self) -> Result<Vec<AuditEntry>>;
    async fn entries_for(&self, name: &str) -> Result<Vec<AuditEntry>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get(&self, username: &str) -> Result<Option<Customer>>;
    async fn upsert(&self, customer: Customer) -> Result<()>;
    async fn all(&self) -> Result<Vec<Customer>>;
}
