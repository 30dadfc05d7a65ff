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
use crate::domain::lead::PhoneNumber;
use crate::domain::notification::Notification;
use crate::domain::phone_number::ProvisionedNumber;
use crate::domain::repositories::PhoneNumberRepository;
use crate::domain::voice::{NumberRequest, VoiceError};
use crate::infrastructure::repositories::PostgresPhoneNumberRepository;

/// Request body for provisioning a number
#[derive(Debug, Default, Deserialize)]
pub struct ProvisionNumberRequest {
    pub area_code: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhoneNumberResponse {
    pub id: Uuid,
    pub number: String,
    pub label: Option<String>,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ProvisionedNumber> for PhoneNumberResponse {
    fn from(number: &ProvisionedNumber) -> Self {
        Self {
            id: number.id(),
            number: number.number().as_str().to_string(),
            label: number.label().map(str::to_string),
            provider_id: number.provider_id().to_string(),
            created_at: number.created_at(),
        }
    }
}

/// The provider hands out numbers already in E.164; normalizing them again
/// would apply local-format rules to foreign numbers
fn granted_number(raw: &str) -> Result<PhoneNumber, VoiceError> {
    PhoneNumber::from_e164(raw).map_err(|e| {
        VoiceError::InvalidResponse(format!(
            "provider returned an unusable number {:?}: {}",
            raw, e
        ))
    })
}

/// Buy a number through the voice provider
///
/// POST /api/phone-numbers
pub async fn provision_phone_number(
    State(state): State<AppState>,
    member: OrgMember,
    Json(req): Json<ProvisionNumberRequest>,
) -> Result<(StatusCode, Json<PhoneNumberResponse>), ApiError> {
    if let Some(area_code) = req.area_code.as_deref() {
        if area_code.is_empty() || !area_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::bad_request("Area code must be digits"));
        }
    }

    let grant = state
        .voice
        .provision_number(&NumberRequest {
            area_code: req.area_code,
            label: req.label.clone(),
        })
        .await?;

    let number = granted_number(&grant.number)?;
    let provisioned =
        ProvisionedNumber::new(member.organization_id, grant.provider_id, number, req.label);

    PostgresPhoneNumberRepository::new(state.pool.clone())
        .save(&provisioned)
        .await?;
    notify(
        &state.pool,
        Notification::phone_number_provisioned(
            member.organization_id,
            provisioned.number().as_str(),
        ),
    )
    .await;

    tracing::info!(
        phone_number_id = %provisioned.id(),
        provider_id = provisioned.provider_id(),
        "Phone number provisioned"
    );
    Ok((StatusCode::CREATED, Json(PhoneNumberResponse::from(&provisioned))))
}

/// GET /api/phone-numbers
pub async fn list_phone_numbers(
    State(state): State<AppState>,
    member: OrgMember,
) -> Result<Json<Vec<PhoneNumberResponse>>, ApiError> {
    let numbers = PostgresPhoneNumberRepository::new(state.pool.clone())
        .find_by_organization(member.organization_id)
        .await?;

    Ok(Json(numbers.iter().map(PhoneNumberResponse::from).collect()))
}

/// Release a number at the provider and forget it
///
/// DELETE /api/phone-numbers/:id
pub async fn delete_phone_number(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = PostgresPhoneNumberRepository::new(state.pool.clone());
    let number = repo
        .find_by_id(id)
        .await?
        .filter(|n| n.organization_id() == member.organization_id)
        .ok_or_else(|| ApiError::not_found(format!("Phone number not found: {}", id)))?;

    match state.voice.release_number(number.provider_id()).await {
        Ok(()) => {}
        // already gone at the provider
        Err(VoiceError::Api { status: 404, .. }) => {
            tracing::warn!(provider_id = number.provider_id(), "Number unknown to provider");
        }
        Err(e) => return Err(e.into()),
    }
    repo.delete(id).await?;

    tracing::info!(phone_number_id = %id, "Phone number released");
    Ok(StatusCode::NO_CONTENT)
}
