use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::phone::{is_e164, PhoneError, PhoneNumber};
use super::value_objects::{Email, LeadStatus};
use crate::domain::errors::{DomainError, DomainResult};

/// Lead aggregate
///
/// A contact imported for a campaign. A lead is unique per organization and
/// phone number; re-importing the same number refreshes the existing lead.
///
/// # Invariants
/// - Leads created here always carry a normalized E.164 phone; rows written by
///   other tools may not, so dialling goes through [`Lead::dialable_number`]
/// - Status changes follow [`LeadStatus::can_transition_to`]
/// - `call_attempts` counts every dial attempt, successful or not
#[derive(Debug, Clone)]
pub struct Lead {
    id: Uuid,
    organization_id: Uuid,
    campaign_id: Option<Uuid>,
    phone: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<Email>,
    status: LeadStatus,
    call_attempts: i32,
    last_called_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    custom_fields: Map<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a new pending lead
    pub fn new(
        organization_id: Uuid,
        campaign_id: Option<Uuid>,
        phone: PhoneNumber,
        first_name: Option<String>,
        last_name: Option<String>,
        email: Option<Email>,
        custom_fields: Map<String, Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            campaign_id,
            phone: phone.into(),
            first_name: non_blank(first_name),
            last_name: non_blank(last_name),
            email,
            status: LeadStatus::Pending,
            call_attempts: 0,
            last_called_at: None,
            last_error: None,
            custom_fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Starts a dial attempt (Pending -> Calling)
    pub fn begin_call(&mut self) -> DomainResult<()> {
        self.transition(LeadStatus::Calling)?;
        self.call_attempts += 1;
        self.last_called_at = Some(Utc::now());
        self.last_error = None;
        Ok(())
    }

    /// The provider accepted the call
    pub fn mark_called(&mut self) -> DomainResult<()> {
        self.transition(LeadStatus::Called)
    }

    /// The attempt failed for a reason that may go away
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.transition(LeadStatus::Failed)?;
        self.last_error = Some(reason.into());
        Ok(())
    }

    /// The number or request was rejected and must not be retried
    pub fn mark_invalid(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.transition(LeadStatus::Invalid)?;
        self.last_error = Some(reason.into());
        Ok(())
    }

    /// Puts a failed lead back in the queue
    pub fn reset(&mut self) -> DomainResult<()> {
        self.transition(LeadStatus::Pending)
    }

    pub fn opt_out(&mut self) -> DomainResult<()> {
        self.transition(LeadStatus::DoNotCall)
    }

    pub fn assign_to_campaign(&mut self, campaign_id: Uuid) {
        self.campaign_id = Some(campaign_id);
        self.updated_at = Utc::now();
    }

    fn transition(&mut self, next: LeadStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::transition(self.status, next));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Full name for display and for the calling assistant, if any part is known
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn campaign_id(&self) -> Option<Uuid> {
        self.campaign_id
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// The stored phone as a dialable E.164 number
    ///
    /// Values that are already E.164 are used verbatim; anything else is
    /// normalized.
    pub fn dialable_number(&self) -> Result<PhoneNumber, PhoneError> {
        if is_e164(self.phone.trim()) {
            PhoneNumber::from_e164(&self.phone)
        } else {
            PhoneNumber::parse(&self.phone)
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn status(&self) -> LeadStatus {
        self.status
    }

    pub fn call_attempts(&self) -> i32 {
        self.call_attempts
    }

    pub fn last_called_at(&self) -> Option<DateTime<Utc>> {
        self.last_called_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn custom_fields(&self) -> &Map<String, Value> {
        &self.custom_fields
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Lead from persistence layer data
    ///
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        organization_id: Uuid,
        campaign_id: Option<Uuid>,
        phone: String,
        first_name: Option<String>,
        last_name: Option<String>,
        email: Option<Email>,
        status: LeadStatus,
        call_attempts: i32,
        last_called_at: Option<DateTime<Utc>>,
        last_error: Option<String>,
        custom_fields: Map<String, Value>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organization_id,
            campaign_id,
            phone,
            first_name,
            last_name,
            email,
            status,
            call_attempts,
            last_called_at,
            last_error,
            custom_fields,
            created_at,
            updated_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
