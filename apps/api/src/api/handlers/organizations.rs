use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::{JwtAuth, OrgMember};
use crate::api::state::AppState;
use crate::domain::organization::{MemberRole, Organization};
use crate::domain::repositories::{OrganizationRepository, RepoError};
use crate::infrastructure::repositories::PostgresOrganizationRepository;

/// Request body for onboarding
#[derive(Debug, Deserialize)]
pub struct SetupOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

impl OrganizationResponse {
    fn new(organization: &Organization, role: MemberRole) -> Self {
        Self {
            id: organization.id(),
            name: organization.name().to_string(),
            slug: organization.slug().to_string(),
            role,
            created_at: organization.created_at(),
        }
    }
}

/// Create the caller's organization and make them its owner
///
/// POST /api/organizations/setup
pub async fn setup_organization(
    State(state): State<AppState>,
    JwtAuth(user_id): JwtAuth,
    Json(req): Json<SetupOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    let repo = PostgresOrganizationRepository::new(state.pool.clone());
    if repo.find_membership(user_id).await?.is_some() {
        return Err(ApiError::conflict("User already belongs to an organization"));
    }

    let (organization, owner) = Organization::new(&req.name, user_id)?;
    repo.create(&organization, &owner).await.map_err(|e| match e {
        // lost a race with a concurrent setup by the same user
        RepoError::Conflict(_) => ApiError::conflict("User already belongs to an organization"),
        other => other.into(),
    })?;

    tracing::info!(
        organization_id = %organization.id(),
        %user_id,
        slug = organization.slug(),
        "Organization created"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse::new(&organization, owner.role)),
    ))
}

/// Get the caller's organization
///
/// GET /api/organizations/me
pub async fn get_my_organization(
    State(state): State<AppState>,
    member: OrgMember,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let organization = PostgresOrganizationRepository::new(state.pool.clone())
        .find_by_id(member.organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization not found"))?;

    Ok(Json(OrganizationResponse::new(&organization, member.role)))
}
