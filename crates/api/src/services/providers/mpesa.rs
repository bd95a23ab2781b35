//! M-Pesa (Daraja) STK push client.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{read_json, ProviderError};
use crate::config::MpesaConfig;

const PROVIDER: &str = "M-Pesa";

/// Daraja timestamps are East Africa Time (UTC+3), formatted `YYYYMMDDHHMMSS`.
pub fn stk_timestamp(now: DateTime<Utc>) -> String {
    (now + ChronoDuration::hours(3))
        .format("%Y%m%d%H%M%S")
        .to_string()
}

/// STK push password: `base64(shortcode + passkey + timestamp)`.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'static str,
    amount: i64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: String,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

/// Synchronous acknowledgement of an STK push request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkPushAck {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: String,
}

impl StkPushAck {
    pub fn accepted(&self) -> bool {
        self.response_code == "0"
    }
}

/// Client for the Daraja OAuth and STK push endpoints.
#[derive(Debug, Clone)]
pub struct MpesaClient {
    client: Client,
    config: MpesaConfig,
    timeout_secs: u64,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig, timeout_secs: u64) -> Result<Self, ProviderError> {
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

    async fn access_token(&self) -> Result<String, ProviderError> {
        let url = format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.config.api_base_url()
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await
            .map_err(|e| ProviderError::from_send(PROVIDER, self.timeout_secs, e))?;

        let token: AccessTokenResponse = read_json(PROVIDER, response).await?;
        Ok(token.access_token)
    }

    /// Prompts `phone` (in `2547XXXXXXXX` form) to pay `amount_kes` whole shillings.
    pub async fn initiate_stk_push(
        &self,
        phone: &str,
        amount_kes: i64,
        account_reference: &str,
        description: &str,
    ) -> Result<StkPushAck, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(PROVIDER));
        }

        let token = self.access_token().await?;
        let timestamp = stk_timestamp(Utc::now());

        let body = StkPushRequest {
            business_short_code: &self.config.shortcode,
            password: stk_password(&self.config.shortcode, &self.config.passkey, &timestamp),
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: amount_kes,
            party_a: phone,
            party_b: &self.config.shortcode,
            phone_number: phone,
            callback_url: self.config.callback_url(),
            account_reference,
            transaction_desc: description,
        };

        let url = format!(
            "{}/mpesa/stkpush/v1/processrequest",
            self.config.api_base_url()
        );
        debug!(url = %url, "Sending STK push");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_send(PROVIDER, self.timeout_secs, e))?;

        let ack: StkPushAck = read_json(PROVIDER, response).await?;
        if !ack.accepted() {
            return Err(ProviderError::Rejected {
                provider: PROVIDER,
                reason: format!("{}: {}", ack.response_code, ack.response_description),
            });
        }

        info!(
            checkout_request_id = %ack.checkout_request_id,
            "STK push accepted"
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stk_timestamp_is_east_africa_time() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 22, 15, 9).unwrap();
        assert_eq!(stk_timestamp(now), "20250302011509");
    }

    #[test]
    fn test_stk_password() {
        let password = stk_password("174379", "passkey", "20250302011509");
        let decoded = STANDARD.decode(password).unwrap();
        assert_eq!(decoded, b"174379passkey20250302011509");
    }

    #[test]
    fn test_stk_request_wire_names() {
        let body = StkPushRequest {
            business_short_code: "174379",
            password: "pw".into(),
            timestamp: "20250302011509".into(),
            transaction_type: "CustomerPayBillOnline",
            amount: 833,
            party_a: "254712345678",
            party_b: "174379",
            phone_number: "254712345678",
            callback_url: "https://example.com/api/mpesa/callback?token=t".into(),
            account_reference: "Daily Package",
            transaction_desc: "Daily Package",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["BusinessShortCode"], "174379");
        assert_eq!(json["PartyA"], "254712345678");
        assert_eq!(json["CallBackURL"], "https://example.com/api/mpesa/callback?token=t");
        assert_eq!(json["Amount"], 833);
    }

    #[test]
    fn test_stk_ack_parsing() {
        let ack: StkPushAck = serde_json::from_value(serde_json::json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing"
        }))
        .unwrap();

        assert!(ack.accepted());
        assert_eq!(ack.checkout_request_id, "ws_CO_191220191020363925");
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = MpesaClient::new(MpesaConfig::default(), 5).unwrap();
        let err = client
            .initiate_stk_push("254712345678", 833, "Daily Package", "Daily Package")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
