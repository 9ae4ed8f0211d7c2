use atelier_core::application::checkout::CheckoutEngine;
use atelier_core::application::customers::CustomerAdmin;
use atelier_core::application::orders::OrderDesk;
use atelier_core::application::quotes::{QuoteDesk, Respondent};
use atelier_core::domain::cart::Cart;
use atelier_core::domain::customer::Customer;
use atelier_core::domain::money::Amount;
use atelier_core::domain::ports::{
    CatalogStore, CatalogStoreBox, CustomerDirectory, CustomerDirectoryBox, OrderStore,
    OrderStoreBox,
};
use atelier_core::domain::quote::NewTailoringRequest;
use atelier_core::error::{CommerceError, Result as CommerceResult};
use atelier_core::infrastructure::in_memory::{
    InMemoryAuditLog, InMemoryCatalog, InMemoryCustomerDirectory, InMemoryOrderStore,
    InMemoryQuoteStore,
};
use atelier_core::interfaces::csv::catalog_reader::CatalogReader;
use atelier_core::interfaces::csv::event_reader::{Event, EventKind, EventReader};
use atelier_core::interfaces::csv::order_writer::OrderWriter;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog seed CSV file (id,name,price,stock,active)
    catalog: PathBuf,

    /// Storefront events CSV file (event,user,reference,quantity,amount,text,note)
    events: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

/// All application services wired over one storage backend, plus the handles
/// the replay loop itself needs.
struct Storefront {
    checkout: CheckoutEngine,
    desk: OrderDesk,
    quotes: QuoteDesk,
    customers: CustomerAdmin,
    catalog: CatalogStoreBox,
    orders: OrderStoreBox,
    directory: CustomerDirectoryBox,
}

impl Storefront {
    fn in_memory() -> Self {
        let catalog = InMemoryCatalog::new();
        let orders = InMemoryOrderStore::new();
        let quotes = InMemoryQuoteStore::new();
        let audit = InMemoryAuditLog::new();
        let directory = InMemoryCustomerDirectory::new();

        Self {
            checkout: CheckoutEngine::new(
                Box::new(catalog.clone()),
                Box::new(orders.clone()),
                Box::new(audit.clone()),
            ),
            desk: OrderDesk::new(
                Box::new(orders.clone()),
                Box::new(catalog.clone()),
                Box::new(audit.clone()),
            ),
            quotes: QuoteDesk::new(Box::new(quotes), Box::new(audit.clone())),
            customers: CustomerAdmin::new(Box::new(directory.clone()), Box::new(audit)),
            catalog: Box::new(catalog),
            orders: Box::new(orders),
            directory: Box::new(directory),
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    fn rocksdb(path: PathBuf) -> CommerceResult<Self> {
        use atelier_core::infrastructure::rocksdb::RocksDbStore;

        let store = RocksDbStore::open(path)?;
        Ok(Self {
            checkout: CheckoutEngine::new(
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store.clone()),
            ),
            desk: OrderDesk::new(
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store.clone()),
            ),
            quotes: QuoteDesk::new(Box::new(store.clone()), Box::new(store.clone())),
            customers: CustomerAdmin::new(Box::new(store.clone()), Box::new(store.clone())),
            catalog: Box::new(store.clone()),
            orders: Box::new(store.clone()),
            directory: Box::new(store),
        })
    }

    async fn signed_in(&self, username: &str) -> CommerceResult<Customer> {
        self.directory
            .get(username)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("customer {username}")))
    }

    /// Applies one storefront event. Carts live in the replay loop, keyed by
    /// username, standing in for per-session state.
    async fn apply(&self, carts: &mut HashMap<String, Cart>, event: Event) -> CommerceResult<()> {
        match event.event {
            EventKind::Register => {
                if event.text.is_empty() {
                    return Err(CommerceError::validation("register needs an email"));
                }
                let mut customer = Customer::new(&event.user, &event.text);
                if !event.note.is_empty() {
                    customer = customer.with_address(&event.note);
                }
                self.directory.upsert(customer).await
            }
            EventKind::Block => {
                self.customers.set_blocked(&event.user, true).await?;
                Ok(())
            }
            EventKind::Unblock => {
                self.customers.set_blocked(&event.user, false).await?;
                Ok(())
            }
            EventKind::CartAdd => {
                let cart = carts.entry(event.user.clone()).or_default();
                cart.add(event.reference()?, event.quantity.unwrap_or(1));
                Ok(())
            }
            EventKind::CartRemove => {
                let cart = carts.entry(event.user.clone()).or_default();
                cart.remove(event.reference()?);
                Ok(())
            }
            EventKind::Checkout => {
                let customer = self.signed_in(&event.user).await?;
                let cart = carts.remove(&event.user).unwrap_or_default();
                match self.checkout.checkout(&customer, cart.clone()).await {
                    Ok(receipt) => {
                        carts.insert(event.user.clone(), receipt.cart);
                        Ok(())
                    }
                    Err(err) => {
                        // a failed checkout leaves the cart as it was
                        carts.insert(event.user.clone(), cart);
                        Err(err)
                    }
                }
            }
            EventKind::OrderStatus => {
                let target = event.text.parse()?;
                let reason = (!event.note.is_empty()).then_some(event.note.as_str());
                self.desk
                    .set_status(event.reference()?, target, reason)
                    .await?;
                Ok(())
            }
            EventKind::Discontinue => {
                self.desk.discontinue_product(event.reference()?).await?;
                Ok(())
            }
            EventKind::QuoteSubmit => {
                let customer = self.signed_in(&event.user).await?;
                let request = NewTailoringRequest {
                    customer: Some(customer.username.clone()),
                    name: customer.username.clone(),
                    email: customer.email.clone(),
                    phone: customer.phone.clone().unwrap_or_default(),
                    garment: event.text.parse()?,
                    description: event.note.clone(),
                };
                self.quotes.submit(request).await?;
                Ok(())
            }
            EventKind::QuoteStatus => {
                let target = event.text.parse()?;
                self.quotes
                    .update_status(event.reference()?, target, &event.note)
                    .await?;
                Ok(())
            }
            EventKind::QuotePrice => {
                let raw = event
                    .amount
                    .ok_or_else(|| CommerceError::validation("quote_price needs an amount"))?;
                let notes = (!event.note.is_empty()).then_some(event.note.as_str());
                self.quotes
                    .set_quotation(event.reference()?, Amount::new(raw)?, notes)
                    .await?;
                Ok(())
            }
            EventKind::QuoteReply => {
                let customer = self.signed_in(&event.user).await?;
                let accept = match event.text.as_str() {
                    "accept" => true,
                    "decline" => false,
                    other => {
                        return Err(CommerceError::validation(format!(
                            "unknown quote reply: {other}"
                        )));
                    }
                };
                let respondent =
                    Respondent::signed_in(customer.username.clone(), customer.email.clone());
                self.quotes
                    .respond(event.reference()?, &respondent, accept)
                    .await?;
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let storefront = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => Storefront::rocksdb(db_path).into_diagnostic()?,
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            miette::bail!("persistent storage requires building with --features storage-rocksdb")
        }
        None => Storefront::in_memory(),
    };

    // Seed the catalog
    let file = File::open(cli.catalog).into_diagnostic()?;
    for product in CatalogReader::new(file).products() {
        match product {
            Ok(product) => {
                if let Err(e) = storefront.catalog.insert(product).await {
                    eprintln!("Error seeding product: {}", e);
                }
            }
            Err(e) => eprintln!("Error reading product: {}", e),
        }
    }

    // Replay the scenario
    let mut carts: HashMap<String, Cart> = HashMap::new();
    let file = File::open(cli.events).into_diagnostic()?;
    for event in EventReader::new(file).events() {
        match event {
            Ok(event) => {
                if let Err(e) = storefront.apply(&mut carts, event).await {
                    eprintln!("Error applying event: {}", e);
                }
            }
            Err(e) => eprintln!("Error reading event: {}", e),
        }
    }

    // Output the final order table
    let orders = storefront.orders.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_orders(orders).into_diagnostic()?;

    Ok(())
}
