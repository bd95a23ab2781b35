//! Admin session entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the admin_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminSessionEntity {
    pub id: Uuid,
    pub jti_hash: String,
    pub admin_email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AdminSessionEntity> for domain::models::admin::AdminSession {
    fn from(entity: AdminSessionEntity) -> Self {
        Self {
            id: entity.id,
            admin_email: entity.admin_email,
            issued_at: entity.issued_at,
            expires_at: entity.expires_at,
            revoked_at: entity.revoked_at,
        }
    }
}
