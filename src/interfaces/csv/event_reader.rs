use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

use crate::error::{CommerceError, Result};

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Register,
    Block,
    Unblock,
    CartAdd,
    CartRemove,
    Checkout,
    OrderStatus,
    Discontinue,
    QuoteSubmit,
    QuoteStatus,
    QuotePrice,
    QuoteReply,
}

/// One storefront event row.
///
/// Column meaning depends on the event kind: `reference` is a product, order
/// or request id; `text` carries a status, garment kind, email or
/// accept/decline answer; `note` carries free text (address, reason,
/// description, admin notes).
#[derive(Debug, Deserialize, Clone)]
pub struct Event {
    pub event: EventKind,
    #[serde(default)]
    pub user: String,
    pub reference: Option<u64>,
    pub quantity: Option<u32>,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub note: String,
}

impl Event {
    pub fn reference(&self) -> Result<u64> {
        self.reference
            .ok_or_else(|| CommerceError::validation("event is missing a reference id"))
    }
}

/// Reads storefront events from a CSV source
/// (`event,user,reference,quantity,amount,text,note`).
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes events, streaming large scenarios.
    pub fn events(self) -> impl Iterator<Item = Result<Event>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CommerceError::from))
    }
}
