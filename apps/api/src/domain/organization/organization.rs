use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

/// Link between a user from the identity provider and their organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

/// Organization aggregate, the tenant boundary for all other data
///
/// # Invariants
/// - Name is non-empty
/// - Slug is derived from the name: lowercase ASCII alphanumerics joined by `-`
#[derive(Debug, Clone)]
pub struct Organization {
    id: Uuid,
    name: String,
    slug: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl Organization {
    /// Onboards a new organization with its creator as owner
    ///
    /// # Example
    /// ```
    /// use dialwave_api::domain::organization::{MemberRole, Organization};
    /// use uuid::Uuid;
    ///
    /// let (org, owner) = Organization::new("Acme Dental", Uuid::new_v4()).unwrap();
    /// assert_eq!(org.slug(), "acme-dental");
    /// assert_eq!(owner.role, MemberRole::Owner);
    /// ```
    pub fn new(name: &str, created_by: Uuid) -> DomainResult<(Self, Membership)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Organization name cannot be empty"));
        }

        let slug = slugify(name);
        if slug.is_empty() {
            return Err(DomainError::validation(
                "Organization name must contain letters or digits",
            ));
        }

        let now = Utc::now();
        let organization = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug,
            created_by,
            created_at: now,
        };
        let owner = Membership {
            organization_id: organization.id,
            user_id: created_by,
            role: MemberRole::Owner,
            created_at: now,
        };

        Ok((organization, owner))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn from_persistence(
        id: Uuid,
        name: String,
        slug: String,
        created_by: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            slug,
            created_by,
            created_at,
        }
    }
}

fn slugify(name: &str) -> String {
    name.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
