use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::call::{Call, CallOutcome, CallStatus};
use crate::domain::repositories::{CallRepository, RepoResult};

const SELECT_CALL: &str = r#"
    SELECT
        id, organization_id, campaign_id, lead_id, provider_call_id, status,
        ended_reason, duration_seconds, cost, summary, recording_url,
        created_at, ended_at, reported_at
    FROM calls
"#;

#[derive(sqlx::FromRow)]
struct CallRow {
    id: Uuid,
    organization_id: Uuid,
    campaign_id: Uuid,
    lead_id: Uuid,
    provider_call_id: String,
    status: CallStatus,
    ended_reason: Option<String>,
    duration_seconds: Option<i32>,
    cost: Option<Decimal>,
    summary: Option<String>,
    recording_url: Option<String>,
    created_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    reported_at: Option<DateTime<Utc>>,
}

impl From<CallRow> for Call {
    fn from(r: CallRow) -> Self {
        Call::from_persistence(
            r.id,
            r.organization_id,
            r.campaign_id,
            r.lead_id,
            r.provider_call_id,
            r.status,
            CallOutcome {
                ended_reason: r.ended_reason,
                duration_seconds: r.duration_seconds,
                cost: r.cost,
                summary: r.summary,
                recording_url: r.recording_url,
            },
            r.created_at,
            r.ended_at,
            r.reported_at,
        )
    }
}

/// PostgreSQL implementation of CallRepository
pub struct PostgresCallRepository {
    pool: PgPool,
}

impl PostgresCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallRepository for PostgresCallRepository {
    async fn save(&self, call: &Call) -> RepoResult<()> {
        let outcome = call.outcome();
        sqlx::query(
            r#"
            INSERT INTO calls (
                id, organization_id, campaign_id, lead_id, provider_call_id, status,
                ended_reason, duration_seconds, cost, summary, recording_url,
                created_at, ended_at, reported_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                ended_reason = EXCLUDED.ended_reason,
                duration_seconds = EXCLUDED.duration_seconds,
                cost = EXCLUDED.cost,
                summary = EXCLUDED.summary,
                recording_url = EXCLUDED.recording_url,
                ended_at = EXCLUDED.ended_at,
                reported_at = EXCLUDED.reported_at
            "#,
        )
        .bind(call.id())
        .bind(call.organization_id())
        .bind(call.campaign_id())
        .bind(call.lead_id())
        .bind(call.provider_call_id())
        .bind(call.status())
        .bind(outcome.ended_reason.as_deref())
        .bind(outcome.duration_seconds)
        .bind(outcome.cost)
        .bind(outcome.summary.as_deref())
        .bind(outcome.recording_url.as_deref())
        .bind(call.created_at())
        .bind(call.ended_at())
        .bind(call.reported_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_provider_id(&self, provider_call_id: &str) -> RepoResult<Option<Call>> {
        let row =
            sqlx::query_as::<_, CallRow>(&format!("{SELECT_CALL} WHERE provider_call_id = $1"))
                .bind(provider_call_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Call::from))
    }

    async fn find_by_campaign(
        &self,
        campaign_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Call>> {
        let rows = sqlx::query_as::<_, CallRow>(&format!(
            "{SELECT_CALL} WHERE campaign_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(campaign_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Call::from).collect())
    }

    async fn count_by_campaign(&self, campaign_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM calls WHERE campaign_id = $1")
            .bind(campaign_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
