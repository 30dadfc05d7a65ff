use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::auth::JwtAuth;
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::organization::MemberRole;
use crate::domain::repositories::OrganizationRepository;
use crate::infrastructure::repositories::PostgresOrganizationRepository;

/// Authenticated user resolved to their organization
///
/// Every tenant-scoped handler takes this instead of [`JwtAuth`]; users who
/// have not completed onboarding get 403.
#[derive(Debug, Clone, Copy)]
pub struct OrgMember {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
}

#[async_trait]
impl FromRequestParts<AppState> for OrgMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(user_id) = JwtAuth::from_request_parts(parts, state).await?;

        let membership = PostgresOrganizationRepository::new(state.pool.clone())
            .find_membership(user_id)
            .await?
            .ok_or_else(|| ApiError::forbidden("User does not belong to an organization"))?;

        Ok(OrgMember {
            user_id,
            organization_id: membership.organization_id,
            role: membership.role,
        })
    }
}
