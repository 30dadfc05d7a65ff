use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::repositories::{NotificationRepository, RepoError, RepoResult};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    organization_id: Uuid,
    kind: NotificationKind,
    title: String,
    message: String,
    campaign_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(r: NotificationRow) -> Self {
        Notification::from_persistence(
            r.id,
            r.organization_id,
            r.kind,
            r.title,
            r.message,
            r.campaign_id,
            r.is_read,
            r.created_at,
        )
    }
}

/// PostgreSQL implementation of NotificationRepository
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn save(&self, notification: &Notification) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, organization_id, kind, title, message, campaign_id, is_read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET is_read = EXCLUDED.is_read
            "#,
        )
        .bind(notification.id())
        .bind(notification.organization_id())
        .bind(notification.kind())
        .bind(notification.title())
        .bind(notification.message())
        .bind(notification.campaign_id())
        .bind(notification.is_read())
        .bind(notification.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_organization(
        &self,
        organization_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> RepoResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, organization_id, kind, title, message, campaign_id, is_read, created_at
            FROM notifications
            WHERE organization_id = $1
              AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(organization_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn count_unread(&self, organization_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE organization_id = $1 AND is_read = FALSE",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, organization_id: Uuid) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(format!("Notification {}", id)));
        }

        Ok(())
    }

    async fn mark_all_read(&self, organization_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE organization_id = $1 AND is_read = FALSE",
        )
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> RepoResult<()> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE id = $1 AND organization_id = $2")
                .bind(id)
                .bind(organization_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(format!("Notification {}", id)));
        }

        Ok(())
    }
}
