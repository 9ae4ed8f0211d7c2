use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One append-only audit record: who was affected, what happened, when.
/// Entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub name: String,
    pub email: String,
    pub action: String,
    pub at: DateTime<Utc>,
}
