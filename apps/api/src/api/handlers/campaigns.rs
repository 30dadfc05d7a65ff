use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notify;
use crate::api::errors::ApiError;
use crate::api::middleware::OrgMember;
use crate::api::state::AppState;
use crate::domain::campaign::{Campaign, CampaignChanges, CampaignEvent, CampaignStatus};
use crate::domain::lead::LeadStatus;
use crate::domain::notification::Notification;
use crate::domain::repositories::{
    CallRepository, CampaignRepository, LeadRepository, PhoneNumberRepository,
};
use crate::infrastructure::repositories::{
    PostgresCallRepository, PostgresCampaignRepository, PostgresLeadRepository,
    PostgresPhoneNumberRepository,
};

/// Request body for creating a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: Option<String>,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<Uuid>,
}

/// Request body for updating a campaign; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: CampaignStatus,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Campaign> for CampaignResponse {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id(),
            name: campaign.name().to_string(),
            description: campaign.description().map(str::to_string),
            status: campaign.status(),
            assistant_id: campaign.assistant_id().map(str::to_string),
            phone_number_id: campaign.phone_number_id(),
            created_by: campaign.created_by(),
            created_at: campaign.created_at(),
            started_at: campaign.started_at(),
            completed_at: campaign.completed_at(),
        }
    }
}

/// Lead counts per status
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct LeadCounts {
    pub pending: i64,
    pub calling: i64,
    pub called: i64,
    pub failed: i64,
    pub invalid: i64,
    pub do_not_call: i64,
}

impl LeadCounts {
    fn from_rows(rows: &[(LeadStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            let slot = match status {
                LeadStatus::Pending => &mut counts.pending,
                LeadStatus::Calling => &mut counts.calling,
                LeadStatus::Called => &mut counts.called,
                LeadStatus::Failed => &mut counts.failed,
                LeadStatus::Invalid => &mut counts.invalid,
                LeadStatus::DoNotCall => &mut counts.do_not_call,
            };
            *slot += count;
        }
        counts
    }

    fn total(&self) -> i64 {
        self.pending + self.calling + self.called + self.failed + self.invalid + self.do_not_call
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignStatsResponse {
    pub campaign_id: Uuid,
    pub status: CampaignStatus,
    pub total_leads: i64,
    pub leads: LeadCounts,
    pub total_calls: i64,
}

/// Loads a campaign of the caller's organization; other tenants' campaigns
/// are reported as missing
pub(crate) async fn load_campaign(
    repo: &PostgresCampaignRepository,
    id: Uuid,
    member: &OrgMember,
) -> Result<Campaign, ApiError> {
    repo.find_by_id(id)
        .await?
        .filter(|c| c.organization_id() == member.organization_id)
        .ok_or_else(|| ApiError::not_found(format!("Campaign not found: {}", id)))
}

/// The phone number must belong to the caller's organization
async fn check_phone_number(
    state: &AppState,
    member: &OrgMember,
    phone_number_id: Option<Uuid>,
) -> Result<(), ApiError> {
    let Some(id) = phone_number_id else {
        return Ok(());
    };
    let owned = PostgresPhoneNumberRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .is_some_and(|n| n.organization_id() == member.organization_id);
    if owned {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Unknown phone number: {}", id)))
    }
}

/// Create a new campaign in draft status
///
/// POST /api/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    member: OrgMember,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    check_phone_number(&state, &member, req.phone_number_id).await?;

    let (campaign, _events) = Campaign::new(
        member.organization_id,
        req.name,
        req.description,
        req.assistant_id,
        req.phone_number_id,
        member.user_id,
    )?;

    PostgresCampaignRepository::new(state.pool.clone())
        .create(&campaign)
        .await?;

    tracing::info!(campaign_id = %campaign.id(), "Campaign created");
    Ok((StatusCode::CREATED, Json(CampaignResponse::from(&campaign))))
}

/// List the organization's campaigns, newest first
///
/// GET /api/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    member: OrgMember,
) -> Result<Json<Vec<CampaignResponse>>, ApiError> {
    let campaigns = PostgresCampaignRepository::new(state.pool.clone())
        .find_by_organization(member.organization_id)
        .await?;

    Ok(Json(campaigns.iter().map(CampaignResponse::from).collect()))
}

/// GET /api/campaigns/:id
pub async fn get_campaign(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let repo = PostgresCampaignRepository::new(state.pool.clone());
    let campaign = load_campaign(&repo, id, &member).await?;

    Ok(Json(CampaignResponse::from(&campaign)))
}

/// Update a draft or paused campaign
///
/// PATCH /api/campaigns/:id
pub async fn update_campaign(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignResponse>, ApiError> {
    check_phone_number(&state, &member, req.phone_number_id).await?;

    let repo = PostgresCampaignRepository::new(state.pool.clone());
    let mut campaign = load_campaign(&repo, id, &member).await?;
    campaign.update(CampaignChanges {
        name: req.name,
        description: req.description,
        assistant_id: req.assistant_id,
        phone_number_id: req.phone_number_id,
    })?;
    // only the settings columns are written, so a concurrent start or pause
    // is never undone by an edit based on a stale read
    if !repo.update_settings(&campaign).await? {
        return Err(ApiError::conflict("Campaign status changed concurrently"));
    }

    Ok(Json(CampaignResponse::from(&campaign)))
}

/// Delete a campaign that is not running
///
/// DELETE /api/campaigns/:id
pub async fn delete_campaign(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = PostgresCampaignRepository::new(state.pool.clone());
    let campaign = load_campaign(&repo, id, &member).await?;
    if !campaign.can_delete() {
        return Err(ApiError::conflict("Pause the campaign before deleting it"));
    }
    repo.delete(id).await?;

    tracing::info!(campaign_id = %id, "Campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Start or resume a campaign and spawn its dispatcher
///
/// POST /api/campaigns/:id/start
pub async fn start_campaign(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    let repo = PostgresCampaignRepository::new(state.pool.clone());
    let mut campaign = load_campaign(&repo, id, &member).await?;

    let previous = campaign.status();
    let event = campaign.start()?;
    if !repo.save_if_status(&campaign, previous).await? {
        return Err(ApiError::conflict("Campaign status changed concurrently"));
    }
    if let Some(notification) = Notification::for_campaign_event(&campaign, &event) {
        notify(&state.pool, notification).await;
    }
    let CampaignEvent::Started { run_id, .. } = event else {
        return Err(ApiError::internal_server_error("Campaign start did not issue a run"));
    };

    // a dispatcher from an earlier run sees the new run_id and stops
    let dispatcher = state.dispatcher();
    tokio::spawn(async move {
        match dispatcher.run_campaign(id, run_id).await {
            Ok(summary) => tracing::info!(campaign_id = %id, ?summary, "Dispatcher stopped"),
            Err(e) => tracing::error!(campaign_id = %id, error = %e, "Dispatcher aborted"),
        }
    });

    tracing::info!(campaign_id = %id, "Campaign started");
    Ok((StatusCode::ACCEPTED, Json(CampaignResponse::from(&campaign))))
}

/// Pause a running campaign; the dispatcher stops before its next call
///
/// POST /api/campaigns/:id/pause
pub async fn pause_campaign(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let repo = PostgresCampaignRepository::new(state.pool.clone());
    let mut campaign = load_campaign(&repo, id, &member).await?;

    let event = campaign.pause()?;
    if !repo.save_if_status(&campaign, CampaignStatus::Active).await? {
        return Err(ApiError::conflict("Campaign status changed concurrently"));
    }
    if let Some(notification) = Notification::for_campaign_event(&campaign, &event) {
        notify(&state.pool, notification).await;
    }

    tracing::info!(campaign_id = %id, "Campaign paused");
    Ok(Json(CampaignResponse::from(&campaign)))
}

/// GET /api/campaigns/:id/stats
pub async fn get_campaign_stats(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignStatsResponse>, ApiError> {
    let repo = PostgresCampaignRepository::new(state.pool.clone());
    let campaign = load_campaign(&repo, id, &member).await?;

    let rows = PostgresLeadRepository::new(state.pool.clone())
        .count_by_status(id)
        .await?;
    let total_calls = PostgresCallRepository::new(state.pool.clone())
        .count_by_campaign(id)
        .await?;
    let leads = LeadCounts::from_rows(&rows);

    Ok(Json(CampaignStatsResponse {
        campaign_id: id,
        status: campaign.status(),
        total_leads: leads.total(),
        leads,
        total_calls,
    }))
}
