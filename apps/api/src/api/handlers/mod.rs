// HTTP handlers, one module per resource

pub mod campaigns;
pub mod health;
pub mod leads;
pub mod notifications;
pub mod organizations;
pub mod phone_numbers;
pub mod webhooks;

use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::notification::Notification;
use crate::domain::repositories::NotificationRepository;
use crate::infrastructure::repositories::PostgresNotificationRepository;

/// `?limit=&offset=` query for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    const DEFAULT_LIMIT: i64 = 50;
    const MAX_LIMIT: i64 = 500;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Stores a notification; failures are logged, never returned to the caller
pub(crate) async fn notify(pool: &PgPool, notification: Notification) {
    let repo = PostgresNotificationRepository::new(pool.clone());
    if let Err(e) = repo.save(&notification).await {
        tracing::warn!(error = %e, kind = ?notification.kind(), "Failed to store notification");
    }
}
