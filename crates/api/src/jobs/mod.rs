//! Background job scheduler and job implementations.

mod admin_session_cleanup;
mod expire_stale_payments;
mod pool_metrics;
mod rate_limiter_prune;
mod scheduler;

pub use admin_session_cleanup::AdminSessionCleanupJob;
pub use expire_stale_payments::ExpireStalePaymentsJob;
pub use pool_metrics::PoolMetricsJob;
pub use rate_limiter_prune::RateLimiterPruneJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
