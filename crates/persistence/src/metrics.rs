//! Database metrics collection.

use metrics::{gauge, histogram};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Snapshot of connection pool usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub active: u32,
}

impl PoolStats {
    pub fn of(pool: &PgPool) -> Self {
        let size = pool.size();
        let idle = pool.num_idle() as u32;
        Self {
            size,
            idle,
            active: size.saturating_sub(idle),
        }
    }
}

/// Record database connection pool gauges.
pub fn record_pool_metrics(pool: &PgPool) -> PoolStats {
    let stats = PoolStats::of(pool);

    gauge!("database_connections_active").set(stats.active as f64);
    gauge!("database_connections_idle").set(stats.idle as f64);
    gauge!("database_connections_total").set(stats.size as f64);

    stats
}

/// Times a repository query and records it on [`QueryTimer::record`].
///
/// ```ignore
/// let timer = QueryTimer::new("find_payment_by_id");
/// let result = sqlx::query_as::<_, PaymentEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
