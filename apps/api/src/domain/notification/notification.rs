use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::campaign::{Campaign, CampaignEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CampaignStarted,
    CampaignPaused,
    CampaignCompleted,
    CallFailed,
    LeadsImported,
    PhoneNumberProvisioned,
}

/// In-app notification shown to every member of an organization
#[derive(Debug, Clone)]
pub struct Notification {
    id: Uuid,
    organization_id: Uuid,
    kind: NotificationKind,
    title: String,
    message: String,
    campaign_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        organization_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        campaign_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            kind,
            title: title.into(),
            message: message.into(),
            campaign_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Builds the notification for a campaign lifecycle event
    ///
    /// Creation is not announced.
    pub fn for_campaign_event(campaign: &Campaign, event: &CampaignEvent) -> Option<Self> {
        let (kind, title, message) = match event {
            CampaignEvent::Created { .. } => return None,
            CampaignEvent::Started { .. } => (
                NotificationKind::CampaignStarted,
                "Campaign started",
                format!("Campaign \"{}\" is now placing calls.", campaign.name()),
            ),
            CampaignEvent::Paused { .. } => (
                NotificationKind::CampaignPaused,
                "Campaign paused",
                format!("Campaign \"{}\" was paused.", campaign.name()),
            ),
            CampaignEvent::Completed { .. } => (
                NotificationKind::CampaignCompleted,
                "Campaign completed",
                format!("Campaign \"{}\" has no more leads to call.", campaign.name()),
            ),
        };

        Some(Self::new(
            campaign.organization_id(),
            kind,
            title,
            message,
            Some(event.campaign_id()),
        ))
    }

    pub fn call_failed(campaign: &Campaign, phone: &str, reason: &str) -> Self {
        Self::new(
            campaign.organization_id(),
            NotificationKind::CallFailed,
            "Call failed",
            format!("Call to {} in \"{}\" failed: {}", phone, campaign.name(), reason),
            Some(campaign.id()),
        )
    }

    pub fn leads_imported(
        organization_id: Uuid,
        campaign_id: Option<Uuid>,
        imported: usize,
        failed: usize,
    ) -> Self {
        let message = if failed == 0 {
            format!("Imported {} leads.", imported)
        } else {
            format!("Imported {} leads, {} rows failed.", imported, failed)
        };
        Self::new(
            organization_id,
            NotificationKind::LeadsImported,
            "Leads imported",
            message,
            campaign_id,
        )
    }

    pub fn phone_number_provisioned(organization_id: Uuid, number: &str) -> Self {
        Self::new(
            organization_id,
            NotificationKind::PhoneNumberProvisioned,
            "Phone number ready",
            format!("{} can now be used for campaigns.", number),
            None,
        )
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn campaign_id(&self) -> Option<Uuid> {
        self.campaign_id
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        organization_id: Uuid,
        kind: NotificationKind,
        title: String,
        message: String,
        campaign_id: Option<Uuid>,
        is_read: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organization_id,
            kind,
            title,
            message,
            campaign_id,
            is_read,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign() -> Campaign {
        let (campaign, _) = Campaign::new(
            Uuid::new_v4(),
            "Renewals".to_string(),
            None,
            None,
            None,
            Uuid::new_v4(),
        )
        .unwrap();
        campaign
    }

    #[test]
    fn created_event_is_silent() {
        let campaign = campaign();
        let event = CampaignEvent::Created {
            campaign_id: campaign.id(),
            organization_id: campaign.organization_id(),
            name: campaign.name().to_string(),
        };
        assert!(Notification::for_campaign_event(&campaign, &event).is_none());
    }

    #[test]
    fn completed_event_notifies_organization() {
        let campaign = campaign();
        let event = CampaignEvent::Completed {
            campaign_id: campaign.id(),
        };

        let notification = Notification::for_campaign_event(&campaign, &event).unwrap();
        assert_eq!(notification.kind(), NotificationKind::CampaignCompleted);
        assert_eq!(notification.organization_id(), campaign.organization_id());
        assert_eq!(notification.campaign_id(), Some(campaign.id()));
        assert!(notification.message().contains("Renewals"));
        assert!(!notification.is_read());
    }

    #[test]
    fn leads_imported_message_mentions_failures() {
        let n = Notification::leads_imported(Uuid::new_v4(), None, 10, 0);
        assert_eq!(n.message(), "Imported 10 leads.");

        let n = Notification::leads_imported(Uuid::new_v4(), None, 8, 2);
        assert_eq!(n.message(), "Imported 8 leads, 2 rows failed.");
    }
}
