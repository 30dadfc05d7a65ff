use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::lead::{Email, Lead, LeadStatus};
use crate::domain::repositories::{LeadRepository, RepoResult};

const SELECT_LEAD: &str = r#"
    SELECT
        id, organization_id, campaign_id, phone,
        first_name, last_name, email, status,
        call_attempts, last_called_at, last_error, custom_fields,
        created_at, updated_at
    FROM leads
"#;

#[derive(sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    organization_id: Uuid,
    campaign_id: Option<Uuid>,
    phone: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    status: LeadStatus,
    call_attempts: i32,
    last_called_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    custom_fields: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeadRow> for Lead {
    fn from(r: LeadRow) -> Self {
        Lead::from_persistence(
            r.id,
            r.organization_id,
            r.campaign_id,
            r.phone,
            r.first_name,
            r.last_name,
            // rows written by other tools may carry junk; treat it as absent
            r.email.and_then(|e| Email::new(e).ok()),
            r.status,
            r.call_attempts,
            r.last_called_at,
            r.last_error,
            r.custom_fields.0,
            r.created_at,
            r.updated_at,
        )
    }
}

/// PostgreSQL implementation of LeadRepository
pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn upsert(&self, lead: &Lead) -> RepoResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO leads (
                id, organization_id, campaign_id, phone,
                first_name, last_name, email, status,
                call_attempts, custom_fields, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (organization_id, phone) DO UPDATE SET
                campaign_id = COALESCE(EXCLUDED.campaign_id, leads.campaign_id),
                first_name = COALESCE(EXCLUDED.first_name, leads.first_name),
                last_name = COALESCE(EXCLUDED.last_name, leads.last_name),
                email = COALESCE(EXCLUDED.email, leads.email),
                custom_fields = leads.custom_fields || EXCLUDED.custom_fields,
                updated_at = EXCLUDED.updated_at
            RETURNING id
            "#,
        )
        .bind(lead.id())
        .bind(lead.organization_id())
        .bind(lead.campaign_id())
        .bind(lead.phone())
        .bind(lead.first_name())
        .bind(lead.last_name())
        .bind(lead.email().map(|e| e.as_str()))
        .bind(lead.status())
        .bind(lead.call_attempts())
        .bind(Json(lead.custom_fields()))
        .bind(lead.created_at())
        .bind(lead.updated_at())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn save_if_status(&self, lead: &Lead, expected: LeadStatus) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                campaign_id = $2,
                status = $3,
                call_attempts = $4,
                last_called_at = $5,
                last_error = $6,
                updated_at = $7
            WHERE id = $1 AND status = $8
            "#,
        )
        .bind(lead.id())
        .bind(lead.campaign_id())
        .bind(lead.status())
        .bind(lead.call_attempts())
        .bind(lead.last_called_at())
        .bind(lead.last_error())
        .bind(lead.updated_at())
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Lead>> {
        let row = sqlx::query_as::<_, LeadRow>(&format!("{SELECT_LEAD} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Lead::from))
    }

    async fn find_by_campaign(
        &self,
        campaign_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Lead>> {
        let rows = sqlx::query_as::<_, LeadRow>(&format!(
            "{SELECT_LEAD} WHERE campaign_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3"
        ))
        .bind(campaign_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Lead::from).collect())
    }

    async fn find_pending(&self, campaign_id: Uuid, limit: i64) -> RepoResult<Vec<Lead>> {
        let rows = sqlx::query_as::<_, LeadRow>(&format!(
            "{SELECT_LEAD} WHERE campaign_id = $1 AND status = 'pending' \
             ORDER BY created_at, id LIMIT $2"
        ))
        .bind(campaign_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Lead::from).collect())
    }

    async fn assign_unassigned(
        &self,
        organization_id: Uuid,
        campaign_id: Uuid,
        limit: i64,
    ) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE leads SET campaign_id = $2, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM leads
                WHERE organization_id = $1
                  AND campaign_id IS NULL
                  AND status = 'pending'
                ORDER BY created_at, id
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(organization_id)
        .bind(campaign_id)
        .bind(limit)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn reset_failed(&self, campaign_id: Uuid, max_attempts: i32) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE leads SET status = 'pending', updated_at = NOW()
            WHERE campaign_id = $1
              AND status = 'failed'
              AND call_attempts < $2
            "#,
        )
        .bind(campaign_id)
        .bind(max_attempts)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_by_status(&self, campaign_id: Uuid) -> RepoResult<Vec<(LeadStatus, i64)>> {
        let rows = sqlx::query_as::<_, (LeadStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM leads
            WHERE campaign_id = $1
            GROUP BY status
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
