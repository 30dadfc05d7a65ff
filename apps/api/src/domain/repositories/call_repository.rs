use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepoResult;
use crate::domain::call::Call;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Save a call (insert or update)
    async fn save(&self, call: &Call) -> RepoResult<()>;

    async fn find_by_provider_id(&self, provider_call_id: &str) -> RepoResult<Option<Call>>;

    /// Calls of a campaign, newest first
    async fn find_by_campaign(
        &self,
        campaign_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Call>>;

    async fn count_by_campaign(&self, campaign_id: Uuid) -> RepoResult<i64>;
}
