use serde::{Deserialize, Serialize};

/// A customer identity snapshot: display name, contact details and the
/// blocked flag. Checkout treats this as read-only input; only
/// `CustomerAdmin` flips the blocked flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub username: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub blocked: bool,
}

impl Customer {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            address: None,
            phone: None,
            blocked: false,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Shipping address for an order header.
    pub fn shipping_address(&self) -> &str {
        self.address.as_deref().unwrap_or("no address on file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_address_falls_back() {
        let c = Customer::new("alice", "alice@example.com");
        assert_eq!(c.shipping_address(), "no address on file");

        let c = c.with_address("12 Main St");
        assert_eq!(c.shipping_address(), "12 Main St");
    }
}
