//! Payment ledger repository.
//!
//! Pool-backed methods run as single statements. The `&mut PgConnection`
//! variants are for use inside the approval transaction.

use chrono::{DateTime, Utc};
use domain::models::payment::NewPayment;
use domain::models::PaymentMethod;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{PaymentEntity, PaymentMethodDb, PaymentOriginDb};
use crate::metrics::QueryTimer;

/// Failure reason recorded by the stale-payment job.
pub const FAILURE_PENDING_TIMEOUT: &str = "pending_timeout";

/// Repository for payment ledger operations.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a pending client-submitted row.
    ///
    /// When `idempotency_key` is set and already used, the existing row is
    /// returned with `false` instead of inserting a second one.
    pub async fn create_pending(
        &self,
        new: &NewPayment,
    ) -> Result<(PaymentEntity, bool), sqlx::Error> {
        let timer = QueryTimer::new("create_pending_payment");
        let inserted = sqlx::query_as::<_, PaymentEntity>(
            r#"
            INSERT INTO payments (user_email, method, origin, amount_minor, currency, phone,
                                  counterparty_reference, idempotency_key, package_name,
                                  duration_hours, raw_provider_payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (idempotency_key) WHERE idempotency_key IS NOT NULL DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&new.user_email)
        .bind(PaymentMethodDb::from(new.method))
        .bind(PaymentOriginDb::from(new.origin))
        .bind(new.amount_minor)
        .bind(new.currency.code())
        .bind(&new.phone)
        .bind(&new.counterparty_reference)
        .bind(&new.idempotency_key)
        .bind(&new.package_name)
        .bind(new.duration_hours)
        .bind(&new.raw_provider_payload)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match (inserted?, new.idempotency_key.as_deref()) {
            (Some(entity), _) => Ok((entity, true)),
            (None, Some(key)) => {
                let existing = self
                    .find_by_idempotency_key(key)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((existing, false))
            }
            (None, None) => Err(sqlx::Error::RowNotFound),
        }
    }

    /// Insert a pending provider row keyed by its provider reference.
    ///
    /// Repeated deliveries for the same reference return the existing row with `false`.
    pub async fn upsert_provider_pending(
        &self,
        new: &NewPayment,
    ) -> Result<(PaymentEntity, bool), sqlx::Error> {
        let timer = QueryTimer::new("upsert_provider_payment");
        let inserted = sqlx::query_as::<_, PaymentEntity>(
            r#"
            INSERT INTO payments (user_email, method, origin, amount_minor, currency, phone,
                                  counterparty_reference, package_name, duration_hours,
                                  raw_provider_payload)
            VALUES ($1, $2, 'provider', $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (method, counterparty_reference) WHERE origin = 'provider' DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&new.user_email)
        .bind(PaymentMethodDb::from(new.method))
        .bind(new.amount_minor)
        .bind(new.currency.code())
        .bind(&new.phone)
        .bind(&new.counterparty_reference)
        .bind(&new.package_name)
        .bind(new.duration_hours)
        .bind(&new.raw_provider_payload)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match inserted? {
            Some(entity) => Ok((entity, true)),
            None => {
                let existing = self
                    .find_provider_row(new.method, &new.counterparty_reference)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((existing, false))
            }
        }
    }

    /// Find a payment by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_payment_by_id");
        let result = sqlx::query_as::<_, PaymentEntity>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a payment by its (hashed) idempotency key.
    pub async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_payment_by_idempotency_key");
        let result =
            sqlx::query_as::<_, PaymentEntity>("SELECT * FROM payments WHERE idempotency_key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Find the provider row for a checkout or order id.
    pub async fn find_provider_row(
        &self,
        method: PaymentMethod,
        reference: &str,
    ) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_provider_payment");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            SELECT * FROM payments
            WHERE method = $1 AND counterparty_reference = $2 AND origin = 'provider'
            "#,
        )
        .bind(PaymentMethodDb::from(method))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Point lookup for status polling.
    ///
    /// Matches the counterparty reference or the hashed idempotency key; the
    /// most recent row wins when a reference was reused after a failure.
    pub async fn find_by_reference(
        &self,
        reference: &str,
        idempotency_key_hash: &str,
    ) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_payment_by_reference");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            SELECT * FROM payments
            WHERE counterparty_reference = $1 OR idempotency_key = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(reference)
        .bind(idempotency_key_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All pending rows, newest first.
    pub async fn list_pending(&self) -> Result<Vec<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_pending_payments");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            SELECT * FROM payments
            WHERE status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Expire provider-initiated rows still pending since before `cutoff`.
    pub async fn expire_stale_provider_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("expire_stale_payments");
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'expired', failure_reason = $2, updated_at = NOW()
            WHERE status = 'pending' AND origin = 'provider' AND created_at < $1
            "#,
        )
        .bind(cutoff)
        .bind(FAILURE_PENDING_TIMEOUT)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Lock a payment row for the rest of the transaction.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_payment_by_id");
        let result =
            sqlx::query_as::<_, PaymentEntity>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await;
        timer.record();
        result
    }

    /// Transition a locked row to approved.
    pub async fn mark_approved(
        conn: &mut PgConnection,
        id: Uuid,
        approved_by: &str,
        provider_receipt: Option<&str>,
        raw_provider_payload: Option<&serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<PaymentEntity, sqlx::Error> {
        let timer = QueryTimer::new("mark_payment_approved");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            UPDATE payments
            SET status = 'approved',
                approved_at = $3,
                approved_by = $2,
                provider_receipt = COALESCE($4, provider_receipt),
                raw_provider_payload = COALESCE($5, raw_provider_payload),
                updated_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approved_by)
        .bind(now)
        .bind(provider_receipt)
        .bind(raw_provider_payload)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Transition a locked row to failed.
    pub async fn mark_failed(
        conn: &mut PgConnection,
        id: Uuid,
        reason: &str,
        raw_provider_payload: Option<&serde_json::Value>,
    ) -> Result<PaymentEntity, sqlx::Error> {
        let timer = QueryTimer::new("mark_payment_failed");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            UPDATE payments
            SET status = 'failed',
                failure_reason = $2,
                raw_provider_payload = COALESCE($3, raw_provider_payload),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(raw_provider_payload)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
