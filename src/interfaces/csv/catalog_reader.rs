use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

use crate::domain::money::Money;
use crate::domain::product::{Product, ProductId};
use crate::error::{CommerceError, Result};

/// One raw catalog row before price validation.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: ProductId,
    name: String,
    price: Decimal,
    stock: u32,
    active: Option<bool>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = CommerceError;

    fn try_from(record: ProductRecord) -> Result<Product> {
        let mut product = Product::new(record.id, record.name, Money::new(record.price)?, record.stock);
        product.active = record.active.unwrap_or(true);
        Ok(product)
    }
}

/// Reads catalog seed rows (`id,name,price,stock,active`) from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding `Result<Product>` lazily so large catalogs stream.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map_err(CommerceError::from)
                .and_then(|record: ProductRecord| record.try_into())
        })
    }
}
