use uuid::Uuid;

/// Domain events that occur within the Campaign aggregate
///
/// Handlers and the dispatcher turn these into user notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignEvent {
    /// Fired when a campaign is created
    Created {
        campaign_id: Uuid,
        organization_id: Uuid,
        name: String,
    },
    /// Fired when a campaign becomes active (first start or resume);
    /// `run_id` identifies the dispatcher run it authorizes
    Started { campaign_id: Uuid, run_id: Uuid },
    /// Fired when a user pauses a campaign
    Paused { campaign_id: Uuid },
    /// Fired when no callable leads remain
    Completed { campaign_id: Uuid },
}

impl CampaignEvent {
    pub fn campaign_id(&self) -> Uuid {
        match self {
            CampaignEvent::Created { campaign_id, .. } => *campaign_id,
            CampaignEvent::Started { campaign_id, .. } => *campaign_id,
            CampaignEvent::Paused { campaign_id } => *campaign_id,
            CampaignEvent::Completed { campaign_id } => *campaign_id,
        }
    }
}
