//! PayPal orders API (v2 checkout) client.

use domain::models::Package;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{read_json, ProviderError};
use crate::config::PaypalConfig;

const PROVIDER: &str = "PayPal";

/// Request body for a CAPTURE-intent order for `package` priced in USD.
pub fn order_body(package: &Package, user_email: &str) -> Value {
    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "reference_id": package.name,
            "custom_id": user_email,
            "amount": {
                "currency_code": "USD",
                "value": shared::validation::format_minor(package.price_usd_cents),
            },
        }],
        "application_context": {
            "brand_name": "AI Therapy Coach",
            "user_action": "PAY_NOW",
        },
    })
}

/// Client for creating, capturing and looking up PayPal orders.
#[derive(Debug, Clone)]
pub struct PaypalClient {
    client: Client,
    config: PaypalConfig,
    timeout_secs: u64,
}

impl PaypalClient {
    pub fn new(config: PaypalConfig, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            client,
            config,
            timeout_secs,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(PROVIDER))
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/v2/checkout/orders", self.config.api_base_url())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
        let response = request
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            // Full representation so purchase units and captures are present.
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| ProviderError::from_send(PROVIDER, self.timeout_secs, e))?;

        read_json(PROVIDER, response).await
    }

    /// Creates an order for `package` and returns the raw order body.
    pub async fn create_order(&self, package: &Package, user_email: &str) -> Result<Value, ProviderError> {
        self.ensure_configured()?;

        let order = self
            .send(
                self.client
                    .post(self.orders_url())
                    .json(&order_body(package, user_email)),
            )
            .await?;

        info!(
            order_id = %order["id"].as_str().unwrap_or_default(),
            package = %package.name,
            "PayPal order created"
        );
        Ok(order)
    }

    /// Captures an approved order and returns the raw order body.
    pub async fn capture_order(&self, order_id: &str) -> Result<Value, ProviderError> {
        self.ensure_configured()?;

        let url = format!("{}/{}/capture", self.orders_url(), order_id);
        debug!(url = %url, "Capturing PayPal order");

        self.send(
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json"),
        )
        .await
    }

    /// Fetches an order by id.
    pub async fn get_order(&self, order_id: &str) -> Result<Value, ProviderError> {
        self.ensure_configured()?;

        let url = format!("{}/{}", self.orders_url(), order_id);
        self.send(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::package;

    #[test]
    fn test_order_body_uses_catalog_usd_price() {
        let daily = package::find_by_id(1).unwrap();
        let body = order_body(daily, "user@example.com");

        assert_eq!(body["intent"], "CAPTURE");
        assert_eq!(body["purchase_units"][0]["amount"]["currency_code"], "USD");
        assert_eq!(body["purchase_units"][0]["amount"]["value"], "6.50");
        assert_eq!(body["purchase_units"][0]["reference_id"], "Daily Package");
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = PaypalClient::new(PaypalConfig::default(), 5).unwrap();
        let err = client.get_order("5O190127TN364715T").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
