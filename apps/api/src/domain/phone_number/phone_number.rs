use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::lead::PhoneNumber;

/// A phone number provisioned through the voice provider for outbound calls
#[derive(Debug, Clone)]
pub struct ProvisionedNumber {
    id: Uuid,
    organization_id: Uuid,
    provider_id: String,
    number: PhoneNumber,
    label: Option<String>,
    created_at: DateTime<Utc>,
}

impl ProvisionedNumber {
    pub fn new(
        organization_id: Uuid,
        provider_id: String,
        number: PhoneNumber,
        label: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            provider_id,
            number,
            label: label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    /// Identifier the voice provider uses for this number
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn number(&self) -> &PhoneNumber {
        &self.number
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn from_persistence(
        id: Uuid,
        organization_id: Uuid,
        provider_id: String,
        number: PhoneNumber,
        label: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organization_id,
            provider_id,
            number,
            label,
            created_at,
        }
    }
}
