use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::organization::{MemberRole, Membership, Organization};
use crate::domain::repositories::{OrganizationRepository, RepoResult};

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    slug: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    organization_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
    created_at: DateTime<Utc>,
}

/// PostgreSQL implementation of OrganizationRepository
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn create(&self, organization: &Organization, owner: &Membership) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(organization.id())
        .bind(organization.name())
        .bind(organization.slug())
        .bind(organization.created_by())
        .bind(organization.created_at())
        .execute(&mut *tx)
        .await?;

        // unique user_id makes a second onboarding of the same user a Conflict
        sqlx::query(
            r#"
            INSERT INTO organization_members (organization_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(owner.organization_id)
        .bind(owner.user_id)
        .bind(owner.role)
        .bind(owner.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, slug, created_by, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            Organization::from_persistence(r.id, r.name, r.slug, r.created_by, r.created_at)
        }))
    }

    async fn find_membership(&self, user_id: Uuid) -> RepoResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT organization_id, user_id, role, created_at
            FROM organization_members
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Membership {
            organization_id: r.organization_id,
            user_id: r.user_id,
            role: r.role,
            created_at: r.created_at,
        }))
    }
}
