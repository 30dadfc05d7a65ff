use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::campaigns::load_campaign;
use super::{notify, Pagination};
use crate::api::errors::ApiError;
use crate::api::middleware::OrgMember;
use crate::api::state::AppState;
use crate::domain::call::{Call, CallStatus};
use crate::domain::lead::{Lead, LeadStatus};
use crate::domain::notification::Notification;
use crate::domain::repositories::{CallRepository, LeadRepository};
use crate::infrastructure::repositories::{
    PostgresCallRepository, PostgresCampaignRepository, PostgresLeadRepository,
};
use crate::services::{ImportSummary, LeadImporter};

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub status: LeadStatus,
    pub call_attempts: i32,
    pub last_called_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub custom_fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&Lead> for LeadResponse {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id(),
            campaign_id: lead.campaign_id(),
            phone: lead.phone().to_string(),
            first_name: lead.first_name().map(str::to_string),
            last_name: lead.last_name().map(str::to_string),
            email: lead.email().map(|e| e.as_str().to_string()),
            status: lead.status(),
            call_attempts: lead.call_attempts(),
            last_called_at: lead.last_called_at(),
            last_error: lead.last_error().map(str::to_string),
            custom_fields: lead.custom_fields().clone(),
            created_at: lead.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub provider_call_id: String,
    pub status: CallStatus,
    pub ended_reason: Option<String>,
    pub duration_seconds: Option<i32>,
    pub cost: Option<Decimal>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&Call> for CallResponse {
    fn from(call: &Call) -> Self {
        let outcome = call.outcome();
        Self {
            id: call.id(),
            lead_id: call.lead_id(),
            provider_call_id: call.provider_call_id().to_string(),
            status: call.status(),
            ended_reason: outcome.ended_reason.clone(),
            duration_seconds: outcome.duration_seconds,
            cost: outcome.cost,
            summary: outcome.summary.clone(),
            recording_url: outcome.recording_url.clone(),
            created_at: call.created_at(),
            ended_at: call.ended_at(),
        }
    }
}

/// Import leads from a CSV request body into a campaign
///
/// POST /api/campaigns/:id/leads/import
pub async fn import_leads(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ImportSummary>, ApiError> {
    let campaigns = PostgresCampaignRepository::new(state.pool.clone());
    load_campaign(&campaigns, id, &member).await?;

    if body.is_empty() {
        return Err(ApiError::bad_request("CSV body is empty"));
    }

    let importer = LeadImporter::new(Arc::new(PostgresLeadRepository::new(state.pool.clone())));
    let summary = importer
        .import(member.organization_id, Some(id), &body)
        .await?;

    if summary.imported > 0 {
        notify(
            &state.pool,
            Notification::leads_imported(
                member.organization_id,
                Some(id),
                summary.imported,
                summary.failed,
            ),
        )
        .await;
    }

    Ok(Json(summary))
}

/// List a campaign's leads, oldest first
///
/// GET /api/campaigns/:id/leads
pub async fn list_leads(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<LeadResponse>>, ApiError> {
    let campaigns = PostgresCampaignRepository::new(state.pool.clone());
    load_campaign(&campaigns, id, &member).await?;

    let leads = PostgresLeadRepository::new(state.pool.clone())
        .find_by_campaign(id, page.limit(), page.offset())
        .await?;

    Ok(Json(leads.iter().map(LeadResponse::from).collect()))
}

/// List a campaign's calls, newest first
///
/// GET /api/campaigns/:id/calls
pub async fn list_calls(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<CallResponse>>, ApiError> {
    let campaigns = PostgresCampaignRepository::new(state.pool.clone());
    load_campaign(&campaigns, id, &member).await?;

    let calls = PostgresCallRepository::new(state.pool.clone())
        .find_by_campaign(id, page.limit(), page.offset())
        .await?;

    Ok(Json(calls.iter().map(CallResponse::from).collect()))
}
