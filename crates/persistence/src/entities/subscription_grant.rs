//! Subscription grant entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{GrantStatus, SubscriptionGrant};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for grant status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "grant_status", rename_all = "lowercase")]
pub enum GrantStatusDb {
    Active,
    Inactive,
}

impl From<GrantStatusDb> for GrantStatus {
    fn from(status: GrantStatusDb) -> Self {
        match status {
            GrantStatusDb::Active => GrantStatus::Active,
            GrantStatusDb::Inactive => GrantStatus::Inactive,
        }
    }
}

/// Database row mapping for the subscription_grants table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionGrantEntity {
    pub user_id: Uuid,
    pub package_name: String,
    pub expiry_at: DateTime<Utc>,
    pub status: GrantStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionGrantEntity> for SubscriptionGrant {
    fn from(entity: SubscriptionGrantEntity) -> Self {
        Self {
            user_id: entity.user_id,
            package_name: entity.package_name,
            expiry_at: entity.expiry_at,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
