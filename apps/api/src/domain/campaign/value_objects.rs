use serde::{Deserialize, Serialize};

/// Represents the lifecycle status of a campaign
///
/// # Status Transitions
/// ```text
/// Draft -> Active <-> Paused
///   |        |          |
///   `--------+----------+--> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "campaign_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being configured, no calls placed yet
    Draft,
    /// Dispatcher is placing calls
    Active,
    /// Stopped by the user, can be resumed
    Paused,
    /// No leads left to call
    Completed,
}

impl CampaignStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use dialwave_api::domain::campaign::CampaignStatus;
    ///
    /// assert!(CampaignStatus::Draft.can_transition_to(CampaignStatus::Active));
    /// assert!(!CampaignStatus::Completed.can_transition_to(CampaignStatus::Active));
    /// ```
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Draft, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Active, Completed)
                | (Paused, Completed)
                | (Draft, Completed)
        )
    }

    /// Settings may only change while no dispatcher is running
    pub fn is_editable(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Paused)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_draft_to_active() {
        assert!(CampaignStatus::Draft.can_transition_to(CampaignStatus::Active));
    }

    #[test]
    fn valid_transition_pause_and_resume() {
        assert!(CampaignStatus::Active.can_transition_to(CampaignStatus::Paused));
        assert!(CampaignStatus::Paused.can_transition_to(CampaignStatus::Active));
    }

    #[test]
    fn valid_transition_to_completed() {
        assert!(CampaignStatus::Active.can_transition_to(CampaignStatus::Completed));
        assert!(CampaignStatus::Paused.can_transition_to(CampaignStatus::Completed));
    }

    #[test]
    fn invalid_transition_active_to_active() {
        assert!(!CampaignStatus::Active.can_transition_to(CampaignStatus::Active));
    }

    #[test]
    fn invalid_transition_draft_to_paused() {
        assert!(!CampaignStatus::Draft.can_transition_to(CampaignStatus::Paused));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(!CampaignStatus::Completed.can_transition_to(CampaignStatus::Active));
        assert!(!CampaignStatus::Completed.can_transition_to(CampaignStatus::Draft));
    }

    #[test]
    fn editable_statuses() {
        assert!(CampaignStatus::Draft.is_editable());
        assert!(CampaignStatus::Paused.is_editable());
        assert!(!CampaignStatus::Active.is_editable());
        assert!(!CampaignStatus::Completed.is_editable());
    }

    #[test]
    fn status_display() {
        assert_eq!(CampaignStatus::Draft.to_string(), "draft");
        assert_eq!(CampaignStatus::Active.to_string(), "active");
        assert_eq!(CampaignStatus::Paused.to_string(), "paused");
        assert_eq!(CampaignStatus::Completed.to_string(), "completed");
    }
}
