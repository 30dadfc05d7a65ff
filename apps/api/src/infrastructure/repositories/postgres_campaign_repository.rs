use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::campaign::{Campaign, CampaignStatus};
use crate::domain::repositories::{CampaignRepository, RepoError, RepoResult};

const SELECT_CAMPAIGN: &str = r#"
    SELECT
        id, organization_id, name, description, status,
        assistant_id, phone_number_id, created_by,
        created_at, started_at, completed_at, run_id
    FROM campaigns
"#;

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    description: Option<String>,
    status: CampaignStatus,
    assistant_id: Option<String>,
    phone_number_id: Option<Uuid>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    run_id: Option<Uuid>,
}

impl From<CampaignRow> for Campaign {
    fn from(r: CampaignRow) -> Self {
        Campaign::from_persistence(
            r.id,
            r.organization_id,
            r.name,
            r.description,
            r.status,
            r.assistant_id,
            r.phone_number_id,
            r.created_by,
            r.created_at,
            r.started_at,
            r.completed_at,
            r.run_id,
        )
    }
}

/// PostgreSQL implementation of CampaignRepository
pub struct PostgresCampaignRepository {
    pool: PgPool,
}

impl PostgresCampaignRepository {
    /// Creates a new PostgresCampaignRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn create(&self, campaign: &Campaign) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, organization_id, name, description, status,
                assistant_id, phone_number_id, created_by,
                created_at, started_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(campaign.id())
        .bind(campaign.organization_id())
        .bind(campaign.name())
        .bind(campaign.description())
        .bind(campaign.status())
        .bind(campaign.assistant_id())
        .bind(campaign.phone_number_id())
        .bind(campaign.created_by())
        .bind(campaign.created_at())
        .bind(campaign.started_at())
        .bind(campaign.completed_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_settings(&self, campaign: &Campaign) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET name = $2, description = $3, assistant_id = $4, phone_number_id = $5
            WHERE id = $1 AND status IN ('draft', 'paused')
            "#,
        )
        .bind(campaign.id())
        .bind(campaign.name())
        .bind(campaign.description())
        .bind(campaign.assistant_id())
        .bind(campaign.phone_number_id())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_if_status(
        &self,
        campaign: &Campaign,
        expected: CampaignStatus,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET status = $2, started_at = $3, completed_at = $4, run_id = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(campaign.id())
        .bind(campaign.status())
        .bind(campaign.started_at())
        .bind(campaign.completed_at())
        .bind(campaign.run_id())
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_if_running(&self, campaign: &Campaign, run_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET status = $2, started_at = $3, completed_at = $4
            WHERE id = $1 AND status = 'active' AND run_id = $5
            "#,
        )
        .bind(campaign.id())
        .bind(campaign.status())
        .bind(campaign.started_at())
        .bind(campaign.completed_at())
        .bind(run_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!("{SELECT_CAMPAIGN} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Campaign::from))
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> RepoResult<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRow>(&format!(
            "{SELECT_CAMPAIGN} WHERE organization_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Campaign::from).collect())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(format!("Campaign {}", id)));
        }

        Ok(())
    }
}
