use std::io::Write;

use crate::domain::order::Order;
use crate::error::Result;

/// Writes the final order table (`order,customer,status,total`) to any
/// `Write` sink, one row per order.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, orders: Vec<Order>) -> Result<()> {
        self.writer
            .write_record(["order", "customer", "status", "total"])?;
        for order in orders {
            self.writer.write_record([
                order.id.to_string(),
                order.customer_name.clone(),
                order.status.to_string(),
                order.total.value().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
