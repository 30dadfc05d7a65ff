use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::OrgMember;
use crate::api::state::AppState;
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::repositories::NotificationRepository;
use crate::infrastructure::repositories::PostgresNotificationRepository;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub campaign_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationResponse {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id(),
            kind: n.kind(),
            title: n.title().to_string(),
            message: n.message().to_string(),
            campaign_id: n.campaign_id(),
            is_read: n.is_read(),
            created_at: n.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    member: OrgMember,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications = PostgresNotificationRepository::new(state.pool.clone())
        .find_by_organization(member.organization_id, query.unread_only, limit)
        .await?;

    Ok(Json(
        notifications.iter().map(NotificationResponse::from).collect(),
    ))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    member: OrgMember,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let count = PostgresNotificationRepository::new(state.pool.clone())
        .count_unread(member.organization_id)
        .await?;

    Ok(Json(UnreadCountResponse { count }))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    PostgresNotificationRepository::new(state.pool.clone())
        .mark_read(id, member.organization_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    member: OrgMember,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = PostgresNotificationRepository::new(state.pool.clone())
        .mark_all_read(member.organization_id)
        .await?;

    Ok(Json(MarkAllReadResponse { updated }))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    member: OrgMember,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    PostgresNotificationRepository::new(state.pool.clone())
        .delete(id, member.organization_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_all_notifications() {
        let query: NotificationQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.unread_only);
        assert_eq!(query.limit, None);
    }
}
