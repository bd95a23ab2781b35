//! Outbound payment provider clients.
//!
//! Every call here completes before the approval workflow opens a database
//! transaction, so no row lock is ever held across a network round trip.

pub mod mpesa;
pub mod paypal;

use thiserror::Error;

pub use mpesa::{MpesaClient, StkPushAck};
pub use paypal::PaypalClient;

/// Errors from payment provider APIs.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} request timed out after {secs}s")]
    Timeout { provider: &'static str, secs: u64 },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} rejected the request: {reason}")]
    Rejected {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    fn from_send(provider: &'static str, secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider, secs }
        } else {
            ProviderError::Http(err)
        }
    }
}

/// Reads a response body, turning non-2xx statuses into [`ProviderError::Status`].
async fn read_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::InvalidResponse {
            provider,
            reason: e.to_string(),
        })
}
