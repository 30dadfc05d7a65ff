use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepoResult;
use crate::domain::notification::Notification;

/// Repository trait for notifications
///
/// Every query is scoped by organization so one tenant can never read or
/// modify another tenant's notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn save(&self, notification: &Notification) -> RepoResult<()>;

    /// Newest first
    async fn find_by_organization(
        &self,
        organization_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> RepoResult<Vec<Notification>>;

    async fn count_unread(&self, organization_id: Uuid) -> RepoResult<i64>;

    async fn mark_read(&self, id: Uuid, organization_id: Uuid) -> RepoResult<()>;

    /// Returns the number of notifications that changed
    async fn mark_all_read(&self, organization_id: Uuid) -> RepoResult<u64>;

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> RepoResult<()>;
}
