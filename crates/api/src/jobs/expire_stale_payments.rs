//! Expires provider-initiated payments that never received a callback.

use chrono::{Duration, Utc};
use persistence::repositories::PaymentRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Marks `mobile_money` and `paypal` rows still pending after
/// `pending_expiry_hours` as `expired`. Manual submissions wait for an admin.
pub struct ExpireStalePaymentsJob {
    repo: PaymentRepository,
    pending_expiry: Duration,
}

impl ExpireStalePaymentsJob {
    pub fn new(pool: PgPool, pending_expiry_hours: i64) -> Self {
        Self {
            repo: PaymentRepository::new(pool),
            pending_expiry: Duration::hours(pending_expiry_hours.max(1)),
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireStalePaymentsJob {
    fn name(&self) -> &'static str {
        "expire_stale_payments"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(15)
    }

    async fn execute(&self) -> Result<u64, String> {
        let cutoff = Utc::now() - self.pending_expiry;
        let expired = self
            .repo
            .expire_stale_provider_pending(cutoff)
            .await
            .map_err(|e| format!("Failed to expire stale payments: {}", e))?;

        if expired > 0 {
            info!(expired, cutoff = %cutoff, "Expired stale provider payments");
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/therapy_coach_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_expiry_window_from_config() {
        let job = ExpireStalePaymentsJob::new(lazy_pool(), 24);
        assert_eq!(job.pending_expiry, Duration::hours(24));
        assert_eq!(job.name(), "expire_stale_payments");
    }

    #[tokio::test]
    async fn test_expiry_window_has_floor() {
        let job = ExpireStalePaymentsJob::new(lazy_pool(), 0);
        assert_eq!(job.pending_expiry, Duration::hours(1));
    }
}
