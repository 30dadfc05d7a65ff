use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepoResult;
use crate::domain::lead::{Lead, LeadStatus};

/// Repository trait for Lead aggregate
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Insert a lead or refresh the existing one with the same organization and phone
    ///
    /// Returns the ID of the stored lead, which differs from `lead.id()` on refresh.
    async fn upsert(&self, lead: &Lead) -> RepoResult<Uuid>;

    /// Persist status and call bookkeeping only if the stored status still
    /// equals `expected`
    ///
    /// Returns false when another writer moved the lead first. Every status
    /// change goes through here, so two writers never both claim a lead.
    async fn save_if_status(&self, lead: &Lead, expected: LeadStatus) -> RepoResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Lead>>;

    /// Leads of a campaign, oldest first
    async fn find_by_campaign(
        &self,
        campaign_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Lead>>;

    /// Pending leads of a campaign, oldest first
    async fn find_pending(&self, campaign_id: Uuid, limit: i64) -> RepoResult<Vec<Lead>>;

    /// Attach up to `limit` pending leads without a campaign to `campaign_id`
    async fn assign_unassigned(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        limit: i64,
    ) -> RepoResult<u64>;

    /// Return failed leads with fewer than `max_attempts` attempts to pending
    async fn reset_failed(&self, campaign_id: Uuid, max_attempts: i32) -> RepoResult<u64>;

    /// Lead count per status for a campaign
    async fn count_by_status(&self, campaign_id: Uuid) -> RepoResult<Vec<(LeadStatus, i64)>>;
}
