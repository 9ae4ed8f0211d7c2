use tracing::info;

use crate::domain::customer::Customer;
use crate::domain::ports::{AuditLogBox, CustomerDirectoryBox};
use crate::error::{CommerceError, Result};

/// Admin-side customer administration. The only mutation this core performs
/// on an identity is the blocked flag; each flip leaves an audit entry.
pub struct CustomerAdmin {
    directory: CustomerDirectoryBox,
    audit: AuditLogBox,
}

impl CustomerAdmin {
    pub fn new(directory: CustomerDirectoryBox, audit: AuditLogBox) -> Self {
        Self { directory, audit }
    }

    pub async fn set_blocked(&self, username: &str, blocked: bool) -> Result<Customer> {
        let mut customer = self
            .directory
            .get(username)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("customer {username}")))?;

        customer.blocked = blocked;
        self.directory.upsert(customer.clone()).await?;

        let action = if blocked { "blocked" } else { "unblocked" };
        self.audit
            .record(&customer.username, &customer.email, action)
            .await?;
        info!(customer = username, blocked, "customer block flag changed");

        Ok(customer)
    }
}
