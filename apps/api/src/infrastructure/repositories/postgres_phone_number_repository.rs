use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::lead::PhoneNumber;
use crate::domain::phone_number::ProvisionedNumber;
use crate::domain::repositories::{PhoneNumberRepository, RepoError, RepoResult};

#[derive(sqlx::FromRow)]
struct PhoneNumberRow {
    id: Uuid,
    organization_id: Uuid,
    provider_id: String,
    number: String,
    label: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PhoneNumberRow> for ProvisionedNumber {
    type Error = RepoError;

    fn try_from(r: PhoneNumberRow) -> Result<Self, Self::Error> {
        let number = PhoneNumber::from_e164(&r.number)
            .map_err(|e| RepoError::Database(format!("Invalid number in phone_numbers: {}", e)))?;
        Ok(ProvisionedNumber::from_persistence(
            r.id,
            r.organization_id,
            r.provider_id,
            number,
            r.label,
            r.created_at,
        ))
    }
}

/// PostgreSQL implementation of PhoneNumberRepository
pub struct PostgresPhoneNumberRepository {
    pool: PgPool,
}

impl PostgresPhoneNumberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhoneNumberRepository for PostgresPhoneNumberRepository {
    async fn save(&self, number: &ProvisionedNumber) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO phone_numbers (id, organization_id, provider_id, number, label, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET label = EXCLUDED.label
            "#,
        )
        .bind(number.id())
        .bind(number.organization_id())
        .bind(number.provider_id())
        .bind(number.number().as_str())
        .bind(number.label())
        .bind(number.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<ProvisionedNumber>> {
        sqlx::query_as::<_, PhoneNumberRow>(
            r#"
            SELECT id, organization_id, provider_id, number, label, created_at
            FROM phone_numbers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ProvisionedNumber::try_from)
        .transpose()
    }

    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> RepoResult<Vec<ProvisionedNumber>> {
        sqlx::query_as::<_, PhoneNumberRow>(
            r#"
            SELECT id, organization_id, provider_id, number, label, created_at
            FROM phone_numbers
            WHERE organization_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ProvisionedNumber::try_from)
        .collect()
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM phone_numbers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(format!("Phone number {}", id)));
        }

        Ok(())
    }
}
