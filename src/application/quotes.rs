use tracing::info;

use crate::domain::money::Amount;
use crate::domain::ports::{AuditLogBox, QuoteStoreBox};
use crate::domain::quote::{
    CustomerResponse, NewTailoringRequest, QuoteId, QuoteStatus, TailoringRequest,
};
use crate::error::{CommerceError, Result};

/// Who is answering a quotation. Signed-in customers carry their username;
/// anonymous requesters are identified by contact email alone.
#[derive(Debug, Clone)]
pub struct Respondent {
    pub username: Option<String>,
    pub email: String,
}

impl Respondent {
    pub fn signed_in(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: email.into(),
        }
    }

    pub fn anonymous(email: impl Into<String>) -> Self {
        Self {
            username: None,
            email: email.into(),
        }
    }
}

/// The custom-tailoring quote workflow: customer submission, admin review and
/// pricing, customer accept/decline.
pub struct QuoteDesk {
    quotes: QuoteStoreBox,
    audit: AuditLogBox,
}

impl QuoteDesk {
    pub fn new(quotes: QuoteStoreBox, audit: AuditLogBox) -> Self {
        Self { quotes, audit }
    }

    /// Files a new request in Pending state.
    pub async fn submit(&self, request: NewTailoringRequest) -> Result<TailoringRequest> {
        if request.name.trim().is_empty() || request.email.trim().is_empty() {
            return Err(CommerceError::validation(
                "name and contact email are required",
            ));
        }
        let created = self.quotes.create(request).await?;
        info!(quote = created.id, garment = %created.garment, "tailoring request submitted");
        Ok(created)
    }

    /// Admin-side status/notes update. Accepted and Cancelled are reserved
    /// for the customer response; Quoted is reachable only through
    /// `set_quotation`; settled requests are immutable.
    pub async fn update_status(
        &self,
        id: QuoteId,
        target: QuoteStatus,
        notes: &str,
    ) -> Result<TailoringRequest> {
        let mut request = self.load(id).await?;

        if request.status.is_terminal() {
            return Err(CommerceError::conflict(format!(
                "tailoring request {id} is settled and can no longer be edited"
            )));
        }
        if target.is_terminal() {
            return Err(CommerceError::validation(
                "accepted/cancelled are reserved for the customer response",
            ));
        }
        if target == QuoteStatus::Quoted {
            return Err(CommerceError::validation(
                "quoting requires an amount; use set_quotation",
            ));
        }
        if !request.status.admin_can_transition_to(target) {
            return Err(CommerceError::validation(format!(
                "tailoring request {id} cannot move from {} to {target}",
                request.status
            )));
        }

        let previous = request.status;
        request.status = target;
        request.admin_notes = notes.to_string();
        self.quotes.save(request.clone()).await?;

        if target == QuoteStatus::Rejected && previous != QuoteStatus::Rejected {
            self.audit
                .record(
                    &request.name,
                    &request.email,
                    &format!("tailoring request {id} -> rejected"),
                )
                .await?;
        }
        info!(quote = id, from = %previous, to = %target, "tailoring request updated");

        Ok(request)
    }

    /// Prices a reviewed request (or re-prices an already quoted one). The
    /// amount travels with the transition; any earlier customer answer is
    /// reset since it applied to a different price.
    pub async fn set_quotation(
        &self,
        id: QuoteId,
        amount: Amount,
        notes: Option<&str>,
    ) -> Result<TailoringRequest> {
        let mut request = self.load(id).await?;

        if request.status.is_terminal() {
            return Err(CommerceError::conflict(format!(
                "tailoring request {id} is settled and can no longer be edited"
            )));
        }
        if !matches!(request.status, QuoteStatus::Reviewed | QuoteStatus::Quoted) {
            return Err(CommerceError::validation(format!(
                "tailoring request {id} must be reviewed before quoting (currently {})",
                request.status
            )));
        }

        request.status = QuoteStatus::Quoted;
        request.quoted_amount = Some(amount);
        request.response = CustomerResponse::Undecided;
        if let Some(notes) = notes {
            request.admin_notes = notes.to_string();
        }
        self.quotes.save(request.clone()).await?;
        info!(quote = id, amount = %amount.value(), "quotation issued");

        Ok(request)
    }

    /// Customer answer to a quotation. Only the owner may respond, only while
    /// the request is exactly Quoted with an amount present; either answer is
    /// terminal.
    pub async fn respond(
        &self,
        id: QuoteId,
        respondent: &Respondent,
        accept: bool,
    ) -> Result<TailoringRequest> {
        let mut request = self.load(id).await?;

        if !request.is_owned_by(respondent.username.as_deref(), &respondent.email) {
            return Err(CommerceError::conflict(
                "not authorized to respond to this tailoring request",
            ));
        }
        if request.status != QuoteStatus::Quoted || request.quoted_amount.is_none() {
            return Err(CommerceError::conflict(format!(
                "tailoring request {id} is not awaiting a customer response"
            )));
        }

        let action;
        if accept {
            request.status = QuoteStatus::Accepted;
            request.response = CustomerResponse::Accepted;
            action = format!("tailoring request {id} -> accepted");
        } else {
            request.status = QuoteStatus::Cancelled;
            request.response = CustomerResponse::Declined;
            action = format!("tailoring request {id} -> cancelled");
        }
        self.quotes.save(request.clone()).await?;
        self.audit
            .record(&request.name, &request.email, &action)
            .await?;
        info!(quote = id, accepted = accept, "customer responded to quotation");

        Ok(request)
    }

    async fn load(&self, id: QuoteId) -> Result<TailoringRequest> {
        self.quotes
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(format!("tailoring request {id}")))
    }
}
