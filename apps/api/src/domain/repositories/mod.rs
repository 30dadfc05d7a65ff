// Repository traits (ports)
// Implemented by infrastructure adapters

pub mod call_repository;
pub mod campaign_repository;
pub mod errors;
pub mod lead_repository;
pub mod notification_repository;
pub mod organization_repository;
pub mod phone_number_repository;

pub use call_repository::CallRepository;
pub use campaign_repository::CampaignRepository;
pub use errors::{RepoError, RepoResult};
pub use lead_repository::LeadRepository;
pub use notification_repository::NotificationRepository;
pub use organization_repository::OrganizationRepository;
pub use phone_number_repository::PhoneNumberRepository;

#[cfg(test)]
pub use call_repository::MockCallRepository;
#[cfg(test)]
pub use campaign_repository::MockCampaignRepository;
#[cfg(test)]
pub use lead_repository::MockLeadRepository;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
#[cfg(test)]
pub use phone_number_repository::MockPhoneNumberRepository;
