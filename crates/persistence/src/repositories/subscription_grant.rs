//! Subscription grant repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::SubscriptionGrantEntity;
use crate::metrics::QueryTimer;

/// Repository for subscription grant operations.
#[derive(Clone)]
pub struct SubscriptionGrantRepository {
    pool: PgPool,
}

impl SubscriptionGrantRepository {
    /// Creates a new SubscriptionGrantRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the grant for a user.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionGrantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_grant_by_user");
        let result = sqlx::query_as::<_, SubscriptionGrantEntity>(
            "SELECT * FROM subscription_grants WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flip the advisory status of a lapsed grant to inactive.
    ///
    /// Guarded on `expiry_at` so a concurrent extension is never overwritten.
    pub async fn mark_inactive_if_lapsed(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_grant_inactive");
        let result = sqlx::query(
            r#"
            UPDATE subscription_grants
            SET status = 'inactive', updated_at = NOW()
            WHERE user_id = $1 AND status = 'active' AND expiry_at <= $2
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Read a user's grant inside a transaction.
    ///
    /// Callers hold the user row lock, which serializes writers for this grant.
    pub async fn find_by_user_id_tx(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionGrantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_grant_by_user_tx");
        let result = sqlx::query_as::<_, SubscriptionGrantEntity>(
            "SELECT * FROM subscription_grants WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert or replace the grant with a precomputed expiry.
    pub async fn upsert(
        conn: &mut PgConnection,
        user_id: Uuid,
        package_name: &str,
        expiry_at: DateTime<Utc>,
    ) -> Result<SubscriptionGrantEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_grant");
        let result = sqlx::query_as::<_, SubscriptionGrantEntity>(
            r#"
            INSERT INTO subscription_grants (user_id, package_name, expiry_at, status)
            VALUES ($1, $2, $3, 'active')
            ON CONFLICT (user_id) DO UPDATE
            SET package_name = EXCLUDED.package_name,
                expiry_at = EXCLUDED.expiry_at,
                status = 'active',
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(package_name)
        .bind(expiry_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
