use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepoResult;
use crate::domain::phone_number::ProvisionedNumber;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhoneNumberRepository: Send + Sync {
    async fn save(&self, number: &ProvisionedNumber) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<ProvisionedNumber>>;

    async fn find_by_organization(&self, organization_id: Uuid)
        -> RepoResult<Vec<ProvisionedNumber>>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;
}
