use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepoResult;
use crate::domain::organization::{Membership, Organization};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Store a new organization together with its first member, atomically
    async fn create(&self, organization: &Organization, owner: &Membership) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Organization>>;

    /// The membership of a user; users belong to at most one organization
    async fn find_membership(&self, user_id: Uuid) -> RepoResult<Option<Membership>>;
}
