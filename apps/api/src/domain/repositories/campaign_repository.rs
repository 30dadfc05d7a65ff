use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepoResult;
use crate::domain::campaign::{Campaign, CampaignStatus};

/// Repository trait for Campaign aggregate
///
/// Defines the contract for persisting and retrieving campaigns.
/// Implementations should handle database-specific details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Insert a new campaign
    async fn create(&self, campaign: &Campaign) -> RepoResult<()>;

    /// Persist edited settings (name, description, assistant, phone number)
    ///
    /// Never touches the status. Returns false when the stored campaign is no
    /// longer Draft or Paused.
    async fn update_settings(&self, campaign: &Campaign) -> RepoResult<bool>;

    /// Persist a status change only if the stored status still equals `expected`
    ///
    /// Returns false when another writer changed the campaign first.
    async fn save_if_status(&self, campaign: &Campaign, expected: CampaignStatus)
        -> RepoResult<bool>;

    /// Persist a status change only while the stored campaign is active
    /// under `run_id`
    ///
    /// Lets a dispatcher finish its own run without touching a later one.
    async fn save_if_running(&self, campaign: &Campaign, run_id: Uuid) -> RepoResult<bool>;

    /// Find a campaign by its ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Campaign>>;

    /// Find all campaigns of an organization, newest first
    async fn find_by_organization(&self, organization_id: Uuid) -> RepoResult<Vec<Campaign>>;

    /// Delete a campaign by ID
    async fn delete(&self, id: Uuid) -> RepoResult<()>;
}
