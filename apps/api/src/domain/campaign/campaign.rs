use super::events::CampaignEvent;
use super::value_objects::CampaignStatus;
use crate::domain::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 200;

/// Campaign aggregate root
///
/// A named batch of outbound calls: the leads assigned to it are dialled
/// by one voice assistant from one provisioned phone number.
///
/// # Invariants
/// - Name is non-empty and at most 200 characters
/// - Only Draft or Paused campaigns can be edited
/// - A campaign can only start with an assistant and a phone number configured
/// - Status transitions follow [`CampaignStatus::can_transition_to`]
/// - Every start or resume issues a fresh `run_id`; only the dispatcher
///   holding the current one may dial for the campaign
///
/// # Example
/// ```
/// use dialwave_api::domain::campaign::Campaign;
/// use uuid::Uuid;
///
/// let (campaign, events) = Campaign::new(
///     Uuid::new_v4(),
///     "Spring renewals".to_string(),
///     None,
///     None,
///     None,
///     Uuid::new_v4(),
/// ).expect("valid campaign");
///
/// assert_eq!(campaign.name(), "Spring renewals");
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Campaign {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    description: Option<String>,
    status: CampaignStatus,
    assistant_id: Option<String>,
    phone_number_id: Option<Uuid>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    run_id: Option<Uuid>,
}

/// Editable campaign settings; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct CampaignChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<Uuid>,
}

impl Campaign {
    /// Creates a new Campaign in Draft status
    ///
    /// # Returns
    /// * `Ok((Campaign, Vec<CampaignEvent>))` - New campaign and a Created event
    /// * `Err(DomainError)` - If the name is empty or too long
    pub fn new(
        organization_id: Uuid,
        name: String,
        description: Option<String>,
        assistant_id: Option<String>,
        phone_number_id: Option<Uuid>,
        created_by: Uuid,
    ) -> DomainResult<(Self, Vec<CampaignEvent>)> {
        let name = validate_name(name)?;

        let campaign = Self {
            id: Uuid::new_v4(),
            organization_id,
            name,
            description: trimmed(description),
            status: CampaignStatus::Draft,
            assistant_id: trimmed(assistant_id),
            phone_number_id,
            created_by,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            run_id: None,
        };

        let events = vec![CampaignEvent::Created {
            campaign_id: campaign.id,
            organization_id: campaign.organization_id,
            name: campaign.name.clone(),
        }];

        Ok((campaign, events))
    }

    /// Applies settings changes
    ///
    /// # Business Rules
    /// - Campaign must be Draft or Paused
    /// - A new name must satisfy the same rules as on creation
    pub fn update(&mut self, changes: CampaignChanges) -> DomainResult<()> {
        if !self.status.is_editable() {
            return Err(DomainError::validation(format!(
                "Cannot edit a campaign in {} status",
                self.status
            )));
        }

        if let Some(name) = changes.name {
            self.name = validate_name(name)?;
        }
        if changes.description.is_some() {
            self.description = trimmed(changes.description);
        }
        if changes.assistant_id.is_some() {
            self.assistant_id = trimmed(changes.assistant_id);
        }
        if let Some(phone_number_id) = changes.phone_number_id {
            self.phone_number_id = Some(phone_number_id);
        }

        Ok(())
    }

    /// Checks that the campaign has everything needed to place calls
    pub fn ensure_ready(&self) -> DomainResult<(&str, Uuid)> {
        let assistant_id = self
            .assistant_id
            .as_deref()
            .ok_or_else(|| DomainError::validation("Campaign has no assistant configured"))?;
        let phone_number_id = self
            .phone_number_id
            .ok_or_else(|| DomainError::validation("Campaign has no phone number configured"))?;
        Ok((assistant_id, phone_number_id))
    }

    /// Starts or resumes the campaign
    ///
    /// # Business Rules
    /// - Campaign must be Draft or Paused
    /// - Assistant and phone number must be configured
    /// - The first start records `started_at`
    /// - A new `run_id` retires any dispatcher left over from an earlier run
    pub fn start(&mut self) -> DomainResult<CampaignEvent> {
        self.ensure_ready()?;
        self.transition(CampaignStatus::Active)?;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        let run_id = Uuid::new_v4();
        self.run_id = Some(run_id);
        Ok(CampaignEvent::Started {
            campaign_id: self.id,
            run_id,
        })
    }

    pub fn pause(&mut self) -> DomainResult<CampaignEvent> {
        self.transition(CampaignStatus::Paused)?;
        Ok(CampaignEvent::Paused { campaign_id: self.id })
    }

    pub fn complete(&mut self) -> DomainResult<CampaignEvent> {
        self.transition(CampaignStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        Ok(CampaignEvent::Completed { campaign_id: self.id })
    }

    /// Whether the dispatcher started with `run_id` may keep dialing
    pub fn is_running(&self, run_id: Uuid) -> bool {
        self.status == CampaignStatus::Active && self.run_id == Some(run_id)
    }

    /// Active campaigns have a dispatcher running and cannot be deleted
    pub fn can_delete(&self) -> bool {
        self.status != CampaignStatus::Active
    }

    fn transition(&mut self, next: CampaignStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::transition(self.status, next));
        }
        self.status = next;
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> CampaignStatus {
        self.status
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    pub fn phone_number_id(&self) -> Option<Uuid> {
        self.phone_number_id
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Reconstructs a Campaign from persistence layer data
    ///
    /// This method bypasses business rules validation since the data
    /// is already validated and stored in the database.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        organization_id: Uuid,
        name: String,
        description: Option<String>,
        status: CampaignStatus,
        assistant_id: Option<String>,
        phone_number_id: Option<Uuid>,
        created_by: Uuid,
        created_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        run_id: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            organization_id,
            name,
            description,
            status,
            assistant_id,
            phone_number_id,
            created_by,
            created_at,
            started_at,
            completed_at,
            run_id,
        }
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("Campaign name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Campaign name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_campaign() -> Campaign {
        let (campaign, _) = Campaign::new(
            Uuid::new_v4(),
            "Renewals".to_string(),
            None,
            Some("asst_123".to_string()),
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
        )
        .unwrap();
        campaign
    }

    #[test]
    fn create_campaign_with_valid_name() {
        let organization_id = Uuid::new_v4();
        let created_by = Uuid::new_v4();

        let (campaign, events) = Campaign::new(
            organization_id,
            "  Renewals ".to_string(),
            Some("Q2 renewals".to_string()),
            None,
            None,
            created_by,
        )
        .unwrap();

        assert_eq!(campaign.name(), "Renewals");
        assert_eq!(campaign.organization_id(), organization_id);
        assert_eq!(campaign.created_by(), created_by);
        assert_eq!(campaign.status(), CampaignStatus::Draft);
        assert_eq!(campaign.description(), Some("Q2 renewals"));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn create_campaign_with_empty_name_fails() {
        let result = Campaign::new(
            Uuid::new_v4(),
            "   ".to_string(),
            None,
            None,
            None,
            Uuid::new_v4(),
        );

        assert_eq!(
            result.unwrap_err(),
            DomainError::validation("Campaign name cannot be empty")
        );
    }

    #[test]
    fn create_campaign_with_long_name_fails() {
        let result = Campaign::new(
            Uuid::new_v4(),
            "x".repeat(201),
            None,
            None,
            None,
            Uuid::new_v4(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn campaign_generates_created_event() {
        let organization_id = Uuid::new_v4();
        let (campaign, events) = Campaign::new(
            organization_id,
            "Renewals".to_string(),
            None,
            None,
            None,
            Uuid::new_v4(),
        )
        .unwrap();

        match &events[0] {
            CampaignEvent::Created {
                campaign_id,
                organization_id: oid,
                name,
            } => {
                assert_eq!(*campaign_id, campaign.id());
                assert_eq!(*oid, organization_id);
                assert_eq!(name, "Renewals");
            }
            _ => panic!("Expected Created event"),
        }
    }

    #[test]
    fn start_requires_assistant_and_phone_number() {
        let (mut campaign, _) = Campaign::new(
            Uuid::new_v4(),
            "Renewals".to_string(),
            None,
            None,
            None,
            Uuid::new_v4(),
        )
        .unwrap();

        let err = campaign.start().unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Campaign has no assistant configured")
        );
        assert_eq!(campaign.status(), CampaignStatus::Draft);
    }

    #[test]
    fn start_sets_started_at_once() {
        let mut campaign = ready_campaign();

        let event = campaign.start().unwrap();
        assert_eq!(
            event,
            CampaignEvent::Started {
                campaign_id: campaign.id(),
                run_id: campaign.run_id().unwrap(),
            }
        );
        let first_start = campaign.started_at().unwrap();

        campaign.pause().unwrap();
        campaign.start().unwrap();
        assert_eq!(campaign.started_at(), Some(first_start));
    }

    #[test]
    fn resume_issues_new_run() {
        let mut campaign = ready_campaign();
        assert_eq!(campaign.run_id(), None);

        campaign.start().unwrap();
        let first_run = campaign.run_id().unwrap();
        assert!(campaign.is_running(first_run));

        campaign.pause().unwrap();
        assert!(!campaign.is_running(first_run));

        campaign.start().unwrap();
        let second_run = campaign.run_id().unwrap();
        assert_ne!(first_run, second_run);
        assert!(!campaign.is_running(first_run));
        assert!(campaign.is_running(second_run));
    }

    #[test]
    fn starting_active_campaign_fails() {
        let mut campaign = ready_campaign();
        campaign.start().unwrap();

        let err = campaign.start().unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn complete_records_timestamp() {
        let mut campaign = ready_campaign();
        campaign.start().unwrap();
        campaign.complete().unwrap();

        assert_eq!(campaign.status(), CampaignStatus::Completed);
        assert!(campaign.completed_at().is_some());
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut campaign = ready_campaign();
        let phone_number_id = campaign.phone_number_id();

        campaign
            .update(CampaignChanges {
                name: Some("Winter renewals".to_string()),
                assistant_id: Some("asst_456".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(campaign.name(), "Winter renewals");
        assert_eq!(campaign.assistant_id(), Some("asst_456"));
        assert_eq!(campaign.phone_number_id(), phone_number_id);
    }

    #[test]
    fn update_rejected_while_active() {
        let mut campaign = ready_campaign();
        campaign.start().unwrap();

        let result = campaign.update(CampaignChanges {
            name: Some("Other".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(campaign.name(), "Renewals");
    }

    #[test]
    fn active_campaign_cannot_be_deleted() {
        let mut campaign = ready_campaign();
        assert!(campaign.can_delete());
        campaign.start().unwrap();
        assert!(!campaign.can_delete());
    }
}
