use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::voice::VoiceGateway;
use crate::infrastructure::repositories::{
    PostgresCallRepository, PostgresCampaignRepository, PostgresLeadRepository,
    PostgresNotificationRepository, PostgresPhoneNumberRepository,
};
use crate::services::{DispatchRepositories, OutboundDispatcher};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub voice: Arc<dyn VoiceGateway>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, voice: Arc<dyn VoiceGateway>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            voice,
        }
    }

    /// A dispatcher over the Postgres repositories, ready to be spawned
    pub fn dispatcher(&self) -> OutboundDispatcher {
        let repos = DispatchRepositories {
            campaigns: Arc::new(PostgresCampaignRepository::new(self.pool.clone())),
            leads: Arc::new(PostgresLeadRepository::new(self.pool.clone())),
            calls: Arc::new(PostgresCallRepository::new(self.pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(self.pool.clone())),
            phone_numbers: Arc::new(PostgresPhoneNumberRepository::new(self.pool.clone())),
        };
        OutboundDispatcher::new(repos, self.voice.clone(), self.config.dispatch.clone())
    }
}
