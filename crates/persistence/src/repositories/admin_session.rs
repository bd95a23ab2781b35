//! Admin session repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::AdminSessionEntity;
use crate::metrics::QueryTimer;

/// Repository for admin session tracking.
#[derive(Clone)]
pub struct AdminSessionRepository {
    pool: PgPool,
}

impl AdminSessionRepository {
    /// Creates a new AdminSessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a newly issued session.
    pub async fn create(
        &self,
        jti_hash: &str,
        admin_email: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<AdminSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_admin_session");
        let result = sqlx::query_as::<_, AdminSessionEntity>(
            r#"
            INSERT INTO admin_sessions (jti_hash, admin_email, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(jti_hash)
        .bind(admin_email)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a session by the hash of its token id.
    pub async fn find_by_jti_hash(
        &self,
        jti_hash: &str,
    ) -> Result<Option<AdminSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_admin_session");
        let result = sqlx::query_as::<_, AdminSessionEntity>(
            "SELECT * FROM admin_sessions WHERE jti_hash = $1",
        )
        .bind(jti_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Revoke a session. Returns false if it was unknown or already revoked.
    pub async fn revoke(&self, jti_hash: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("revoke_admin_session");
        let result = sqlx::query(
            r#"
            UPDATE admin_sessions
            SET revoked_at = NOW()
            WHERE jti_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(jti_hash)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Revoke `old_jti_hash` and record its replacement atomically.
    ///
    /// Returns `None` when the old session was already revoked, so a token can
    /// be rotated only once.
    pub async fn rotate(
        &self,
        old_jti_hash: &str,
        new_jti_hash: &str,
        admin_email: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<AdminSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("rotate_admin_session");
        let mut tx = self.pool.begin().await?;

        let revoked = sqlx::query(
            r#"
            UPDATE admin_sessions
            SET revoked_at = NOW()
            WHERE jti_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(old_jti_hash)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        let session = sqlx::query_as::<_, AdminSessionEntity>(
            r#"
            INSERT INTO admin_sessions (jti_hash, admin_email, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new_jti_hash)
        .bind(admin_email)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(session))
    }

    /// Delete sessions that expired before `cutoff`.
    pub async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_admin_sessions");
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
