//! Deletes expired admin sessions.

use chrono::Utc;
use persistence::repositories::AdminSessionRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct AdminSessionCleanupJob {
    repo: AdminSessionRepository,
}

impl AdminSessionCleanupJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: AdminSessionRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for AdminSessionCleanupJob {
    fn name(&self) -> &'static str {
        "admin_session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<u64, String> {
        let deleted = self
            .repo
            .delete_expired(Utc::now())
            .await
            .map_err(|e| format!("Failed to delete expired admin sessions: {}", e))?;

        if deleted > 0 {
            info!(deleted, "Deleted expired admin sessions");
        }
        Ok(deleted)
    }
}
