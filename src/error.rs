use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommerceError>;

/// One failing cart line in a rejected checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    pub product: String,
    pub reason: LineFailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFailureReason {
    /// The product is inactive or no longer exists.
    Unavailable,
    /// Requested quantity exceeds the stock seen under the row lock.
    InsufficientStock { available: u32, requested: u32 },
}

impl fmt::Display for LineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            LineFailureReason::Unavailable => write!(f, "{} (unavailable)", self.product),
            LineFailureReason::InsufficientStock {
                available,
                requested,
            } => write!(
                f,
                "{} (available: {}, requested: {})",
                self.product, available, requested
            ),
        }
    }
}

/// Aggregated per-line report for a rejected checkout. The whole cart is
/// validated before reporting so the customer sees every conflicting entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReport(pub Vec<LineFailure>);

impl fmt::Display for StockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for failure in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not enough stock for: {0}")]
    OutOfStock(StockReport),
    #[error("{0} not found")]
    NotFound(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl CommerceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_report_display_lists_every_line() {
        let report = StockReport(vec![
            LineFailure {
                product: "Hoodie".into(),
                reason: LineFailureReason::InsufficientStock {
                    available: 1,
                    requested: 3,
                },
            },
            LineFailure {
                product: "Shirt".into(),
                reason: LineFailureReason::Unavailable,
            },
        ]);
        let err = CommerceError::OutOfStock(report);
        assert_eq!(
            err.to_string(),
            "not enough stock for: Hoodie (available: 1, requested: 3); Shirt (unavailable)"
        );
    }
}
