//! Client polling policy for asynchronous payment confirmation.

use serde::Serialize;

use crate::models::payment::PaymentStatus;

/// Seconds between client status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Attempts before a client stops polling.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 18;

/// Status reported to a polling client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    NotFound,
    Pending,
    Approved,
    Failed,
    Expired,
    /// Still pending after the client's last allowed attempt. Not a failure:
    /// the provider may still confirm later through its callback.
    NotYetConfirmed,
}

/// Bounds on client polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollPolicy {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Total time a client keeps polling.
    pub fn timeout_secs(&self) -> u64 {
        self.interval_secs * u64::from(self.max_attempts)
    }

    /// Maps a ledger status (or its absence) to what the client should see on
    /// poll number `attempt` (1-based).
    pub fn outcome(&self, status: Option<PaymentStatus>, attempt: Option<u32>) -> PollOutcome {
        match status {
            None => PollOutcome::NotFound,
            Some(PaymentStatus::Approved) => PollOutcome::Approved,
            Some(PaymentStatus::Failed) => PollOutcome::Failed,
            Some(PaymentStatus::Expired) => PollOutcome::Expired,
            Some(PaymentStatus::Pending) => match attempt {
                Some(n) if n >= self.max_attempts => PollOutcome::NotYetConfirmed,
                _ => PollOutcome::Pending,
            },
        }
    }

    /// Whether a client that saw `outcome` on poll `attempt` should poll again.
    pub fn should_continue(&self, outcome: PollOutcome, attempt: u32) -> bool {
        outcome == PollOutcome::Pending && attempt < self.max_attempts
    }
}

/// Response to a status poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentStatusResponse {
    pub reference: String,
    pub status: PollOutcome,
    pub poll_again: bool,
    pub poll: PollPolicy,
}
