use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Amount;
use crate::error::CommerceError;

pub type QuoteId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum GarmentKind {
    Hoodie,
    Shirt,
    Trousers,
    Other,
}

impl fmt::Display for GarmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GarmentKind::Hoodie => "hoodie",
            GarmentKind::Shirt => "shirt",
            GarmentKind::Trousers => "trousers",
            GarmentKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for GarmentKind {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hoodie" => Ok(GarmentKind::Hoodie),
            "shirt" => Ok(GarmentKind::Shirt),
            "trousers" => Ok(GarmentKind::Trousers),
            "other" => Ok(GarmentKind::Other),
            other => Err(CommerceError::validation(format!(
                "unknown garment kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Reviewed,
    Quoted,
    Rejected,
    Accepted,
    Cancelled,
}

impl QuoteStatus {
    /// Accepted and Cancelled are customer decisions; the record is immutable
    /// to administrators once it reaches either.
    pub fn is_terminal(self) -> bool {
        matches!(self, QuoteStatus::Accepted | QuoteStatus::Cancelled)
    }

    /// Admin-side transition table for `update_status`. Quoted is excluded
    /// here: the only door into Quoted is `set_quotation`, which carries the
    /// amount. Same-status updates are allowed for notes edits.
    pub fn admin_can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        if self.is_terminal() || next.is_terminal() || next == Quoted {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Reviewed)
                | (Pending, Rejected)
                | (Reviewed, Reviewed)
                | (Reviewed, Rejected)
                | (Quoted, Rejected)
                | (Rejected, Rejected)
        )
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Reviewed => "reviewed",
            QuoteStatus::Quoted => "quoted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for QuoteStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "reviewed" => Ok(QuoteStatus::Reviewed),
            "quoted" => Ok(QuoteStatus::Quoted),
            "rejected" => Ok(QuoteStatus::Rejected),
            "accepted" => Ok(QuoteStatus::Accepted),
            "cancelled" => Ok(QuoteStatus::Cancelled),
            other => Err(CommerceError::validation(format!(
                "unknown quote status: {other}"
            ))),
        }
    }
}

/// The customer's answer to a quotation. Kept as a three-way variant rather
/// than an optional bool so "not answered yet" is explicit.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerResponse {
    #[default]
    Undecided,
    Accepted,
    Declined,
}

/// A custom-tailoring request. `customer` holds the submitter's username when
/// the request was made while signed in; anonymous requests are owned by
/// their contact email instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoringRequest {
    pub id: QuoteId,
    pub customer: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub garment: GarmentKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: QuoteStatus,
    pub admin_notes: String,
    pub quoted_amount: Option<Amount>,
    pub response: CustomerResponse,
}

/// Submission payload; id, timestamp and workflow fields are assigned by the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTailoringRequest {
    pub customer: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub garment: GarmentKind,
    pub description: String,
}

impl TailoringRequest {
    /// Whether `username`/`email` identify the requester: by reference when
    /// the request was submitted signed-in, by contact email otherwise.
    pub fn is_owned_by(&self, username: Option<&str>, email: &str) -> bool {
        match &self.customer {
            Some(owner) => username == Some(owner.as_str()),
            None => self.email == email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_transition_table() {
        use QuoteStatus::*;
        assert!(Pending.admin_can_transition_to(Reviewed));
        assert!(Pending.admin_can_transition_to(Rejected));
        assert!(Reviewed.admin_can_transition_to(Rejected));
        assert!(Quoted.admin_can_transition_to(Rejected));
        assert!(Rejected.admin_can_transition_to(Rejected));
        // notes-only updates
        assert!(Pending.admin_can_transition_to(Pending));
        assert!(Reviewed.admin_can_transition_to(Reviewed));

        // quoting carries an amount, so it has its own operation
        assert!(!Reviewed.admin_can_transition_to(Quoted));
        // customer decisions are not admin targets
        assert!(!Quoted.admin_can_transition_to(Accepted));
        assert!(!Quoted.admin_can_transition_to(Cancelled));
        // no backward moves, no edits to settled requests
        assert!(!Reviewed.admin_can_transition_to(Pending));
        assert!(!Accepted.admin_can_transition_to(Rejected));
        assert!(!Cancelled.admin_can_transition_to(Cancelled));
    }

    #[test]
    fn test_ownership_by_reference_or_email() {
        let mut req = TailoringRequest {
            id: 1,
            customer: Some("alice".into()),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: "+1 555 0100".into(),
            garment: GarmentKind::Hoodie,
            description: "embroidered hood".into(),
            created_at: Utc::now(),
            status: QuoteStatus::Pending,
            admin_notes: String::new(),
            quoted_amount: None,
            response: CustomerResponse::Undecided,
        };

        assert!(req.is_owned_by(Some("alice"), "other@example.com"));
        assert!(!req.is_owned_by(Some("bob"), "alice@example.com"));
        // a signed-in owner is matched by reference, not by email
        assert!(!req.is_owned_by(None, "alice@example.com"));

        req.customer = None;
        assert!(req.is_owned_by(None, "alice@example.com"));
        assert!(!req.is_owned_by(None, "bob@example.com"));
    }
}
