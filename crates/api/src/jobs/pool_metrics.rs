//! Connection pool gauges.

use sqlx::PgPool;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};

/// Records pool size, idle and active connection gauges.
pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<u64, String> {
        let stats = persistence::metrics::record_pool_metrics(&self.pool);
        debug!(size = stats.size, idle = stats.idle, active = stats.active, "Pool metrics recorded");
        Ok(0)
    }
}
