//! Drops rate limiter cells for idle clients.

use std::sync::Arc;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::RateLimiterState;

pub struct RateLimiterPruneJob {
    limiter: Arc<RateLimiterState>,
}

impl RateLimiterPruneJob {
    pub fn new(limiter: Arc<RateLimiterState>) -> Self {
        Self { limiter }
    }
}

#[async_trait::async_trait]
impl Job for RateLimiterPruneJob {
    fn name(&self) -> &'static str {
        "rate_limiter_prune"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<u64, String> {
        let before = self.limiter.tracked_clients();
        let after = self.limiter.prune();
        metrics::gauge!("rate_limiter_tracked_clients").set(after as f64);
        debug!(before, after, "Rate limiter pruned");
        Ok(before.saturating_sub(after) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[tokio::test]
    async fn test_prune_keeps_limited_clients() {
        let limiter = Arc::new(RateLimiterState::new(1, false));
        let client: IpAddr = "192.0.2.10".parse().unwrap();
        limiter.check(client).unwrap();

        let job = RateLimiterPruneJob::new(limiter.clone());
        assert_eq!(job.frequency(), JobFrequency::Minutes(1));
        assert_eq!(job.execute().await, Ok(0));
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.check(client).is_err());
    }
}
