// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod postgres_call_repository;
pub mod postgres_campaign_repository;
pub mod postgres_lead_repository;
pub mod postgres_notification_repository;
pub mod postgres_organization_repository;
pub mod postgres_phone_number_repository;

pub use postgres_call_repository::PostgresCallRepository;
pub use postgres_campaign_repository::PostgresCampaignRepository;
pub use postgres_lead_repository::PostgresLeadRepository;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_phone_number_repository::PostgresPhoneNumberRepository;
