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
use crate::error::{CommerceError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Column Family for catalog products.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for orders (each row embeds its lines).
pub const CF_ORDERS: &str = "orders";
/// Column Family for tailoring requests.
pub const CF_QUOTES: &str = "quotes";
/// Column Family for the append-only audit log.
pub const CF_AUDIT: &str = "audit";
/// Column Family for the customer directory.
pub const CF_CUSTOMERS: &str = "customers";

impl From<rocksdb::Error> for CommerceError {
    fn from(err: rocksdb::Error) -> Self {
        CommerceError::Internal(Box::new(err))
    }
}

/// A persistent store implementation using RocksDB.
///
/// Each entity gets its own Column Family with big-endian numeric keys (so
/// iteration order matches id order) and serde_json row encoding. Product row
/// locks are an in-process lock table: RocksDB itself has no row locks, and
/// the checkout engine only needs serialization within one process, matching
/// the in-memory store's guarantee.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    row_locks: Arc<RwLock<HashMap<ProductId, Arc<Mutex<()>>>>>,
    next_order_id: Arc<AtomicU64>,
    next_quote_id: Arc<AtomicU64>,
    next_audit_seq: Arc<AtomicU64>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all column families exist and re-seeding the id counters from the
    /// highest keys already present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_PRODUCTS, CF_ORDERS, CF_QUOTES, CF_AUDIT, CF_CUSTOMERS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        let db = Arc::new(db);

        let next_order_id = Arc::new(AtomicU64::new(last_key(&db, CF_ORDERS)?));
        let next_quote_id = Arc::new(AtomicU64::new(last_key(&db, CF_QUOTES)?));
        let next_audit_seq = Arc::new(AtomicU64::new(last_key(&db, CF_AUDIT)?));

        Ok(Self {
            db,
            row_locks: Arc::new(RwLock::new(HashMap::new())),
            next_order_id,
            next_quote_id,
            next_audit_seq,
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        cf_handle(&self.db, name)
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: u64, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(&cf, key.to_be_bytes(), encode(value)?)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, key: u64) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(decode(&value)?);
        }
        Ok(rows)
    }

    async fn row_lock(&self, id: ProductId) -> Arc<Mutex<()>> {
        {
            let locks = self.row_locks.read().await;
            if let Some(lock) = locks.get(&id) {
                return lock.clone();
            }
        }
        let mut locks = self.row_locks.write().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn cf_handle<'a>(db: &'a DB, name: &str) -> Result<&'a rocksdb::ColumnFamily> {
    db.cf_handle(name).ok_or_else(|| {
        CommerceError::Internal(Box::new(std::io::Error::other(format!(
            "{name} column family not found"
        ))))
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CommerceError::Internal(Box::new(e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CommerceError::Internal(Box::new(e)))
}

/// Highest numeric key in a column family, 0 when empty. Used to re-seed id
/// counters when reopening an existing database.
fn last_key(db: &DB, cf_name: &str) -> Result<u64> {
    let cf = cf_handle(db, cf_name)?;
    if let Some(item) = db.iterator_cf(cf, rocksdb::IteratorMode::End).next() {
        let (key, _value) = item?;
        let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
            CommerceError::Internal(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed key in {cf_name}"),
            )))
        })?;
        Ok(u64::from_be_bytes(bytes))
    } else {
        Ok(0)
    }
}

struct RocksDbProductRow {
    store: RocksDbStore,
    id: ProductId,
    current: Option<Product>,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl ProductRow for RocksDbProductRow {
    fn product(&self) -> Option<&Product> {
        self.current.as_ref()
    }

    async fn save(&mut self, product: Product) -> Result<()> {
        self.store.put(CF_PRODUCTS, self.id, &product)?;
        self.current = Some(product);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for RocksDbStore {
    async fn insert(&self, product: Product) -> Result<()> {
        self.put(CF_PRODUCTS, product.id, &product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        self.fetch(CF_PRODUCTS, id)
    }

    async fn lock_for_update(&self, id: ProductId) -> Result<Box<dyn ProductRow>> {
        let lock = self.row_lock(id).await;
        let guard = lock.lock_owned().await;
        // read the row only after the lock is held
        let current = self.fetch(CF_PRODUCTS, id)?;
        Ok(Box::new(RocksDbProductRow {
            store: self.clone(),
            id,
            current,
            _guard: guard,
        }))
    }

    async fn save(&self, product: Product) -> Result<()> {
        self.put(CF_PRODUCTS, product.id, &product)
    }

    async fn all(&self) -> Result<Vec<Product>> {
        self.scan(CF_PRODUCTS)
    }
}

#[async_trait]
impl OrderStore for RocksDbStore {
    async fn create(&self, customer_name: &str, email: &str, address: &str) -> Result<Order> {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst) + 1;
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
        self.put(CF_ORDERS, id, &order)?;
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.fetch(CF_ORDERS, id)
    }

    async fn save(&self, order: Order) -> Result<()> {
        self.put(CF_ORDERS, order.id, &order)
    }

    async fn save_all(&self, batch: Vec<Order>) -> Result<()> {
        let cf = self.cf(CF_ORDERS)?;
        let mut write = WriteBatch::default();
        for order in &batch {
            write.put_cf(&cf, order.id.to_be_bytes(), encode(order)?);
        }
        self.db.write(write)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Order>> {
        self.scan(CF_ORDERS)
    }

    async fn open_orders_containing(&self, product: ProductId) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|o| o.status.is_open() && o.contains_product(product))
            .collect())
    }
}

#[async_trait]
impl QuoteStore for RocksDbStore {
    async fn create(&self, request: NewTailoringRequest) -> Result<TailoringRequest> {
        let id = self.next_quote_id.fetch_add(1, Ordering::SeqCst) + 1;
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
        self.put(CF_QUOTES, id, &request)?;
        Ok(request)
    }

    async fn get(&self, id: QuoteId) -> Result<Option<TailoringRequest>> {
        self.fetch(CF_QUOTES, id)
    }

    async fn save(&self, request: TailoringRequest) -> Result<()> {
        self.put(CF_QUOTES, request.id, &request)
    }

    async fn all(&self) -> Result<Vec<TailoringRequest>> {
        self.scan(CF_QUOTES)
    }
}

#[async_trait]
impl AuditLog for RocksDbStore {
    async fn record(&self, name: &str, email: &str, action: &str) -> Result<()> {
        let seq = self.next_audit_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = AuditEntry {
            name: name.to_string(),
            email: email.to_string(),
            action: action.to_string(),
            at: Utc::now(),
        };
        self.put(CF_AUDIT, seq, &entry)
    }

    async fn entries(&self) -> Result<Vec<AuditEntry>> {
        self.scan(CF_AUDIT)
    }

    async fn entries_for(&self, name: &str) -> Result<Vec<AuditEntry>> {
        let entries: Vec<AuditEntry> = self.scan(CF_AUDIT)?;
        Ok(entries.into_iter().filter(|e| e.name == name).collect())
    }
}

#[async_trait]
impl CustomerDirectory for RocksDbStore {
    async fn get(&self, username: &str) -> Result<Option<Customer>> {
        let cf = self.cf(CF_CUSTOMERS)?;
        match self.db.get_cf(&cf, username.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, customer: Customer) -> Result<()> {
        let cf = self.cf(CF_CUSTOMERS)?;
        self.db
            .put_cf(&cf, customer.username.as_bytes(), encode(&customer)?)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Customer>> {
        self.scan(CF_CUSTOMERS)
    }
}
