//! Provider payload parsing.
//!
//! Third-party payloads are parsed into strict records before any business
//! logic sees them. A payload missing a field required for its outcome is
//! rejected rather than partially used.

use serde::Deserialize;
use thiserror::Error;

use crate::models::package::Currency;
use crate::models::payment::PaymentMethod;

/// Error parsing a provider payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackParseError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// M-Pesa STK callback wire format.

#[derive(Debug, Deserialize)]
struct MpesaEnvelope {
    #[serde(rename = "Body")]
    body: MpesaBody,
}

#[derive(Debug, Deserialize)]
struct MpesaBody {
    #[serde(rename = "stkCallback")]
    stk_callback: RawStkCallback,
}

#[derive(Debug, Deserialize)]
struct RawStkCallback {
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    result_desc: String,
    #[serde(rename = "CallbackMetadata")]
    callback_metadata: Option<RawCallbackMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawCallbackMetadata {
    #[serde(rename = "Item", default)]
    item: Vec<RawMetadataItem>,
}

#[derive(Debug, Deserialize)]
struct RawMetadataItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value")]
    value: Option<serde_json::Value>,
}

impl RawCallbackMetadata {
    fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.item
            .iter()
            .find(|i| i.name == name)
            .and_then(|i| i.value.as_ref())
    }
}

/// A parsed M-Pesa STK push result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MpesaStkResult {
    Paid {
        checkout_request_id: String,
        amount_minor: i64,
        receipt: String,
        phone: String,
    },
    Failed {
        checkout_request_id: String,
        result_code: i64,
        result_desc: String,
    },
}

impl MpesaStkResult {
    pub fn checkout_request_id(&self) -> &str {
        match self {
            MpesaStkResult::Paid {
                checkout_request_id,
                ..
            }
            | MpesaStkResult::Failed {
                checkout_request_id,
                ..
            } => checkout_request_id,
        }
    }
}

/// Parses an M-Pesa STK callback body.
pub fn parse_mpesa_callback(payload: &serde_json::Value) -> Result<MpesaStkResult, CallbackParseError> {
    let envelope: MpesaEnvelope = serde_json::from_value(payload.clone())
        .map_err(|e| CallbackParseError::Malformed(e.to_string()))?;
    let callback = envelope.body.stk_callback;

    if callback.checkout_request_id.trim().is_empty() {
        return Err(CallbackParseError::MissingField("CheckoutRequestID"));
    }

    if callback.result_code != 0 {
        return Ok(MpesaStkResult::Failed {
            checkout_request_id: callback.checkout_request_id,
            result_code: callback.result_code,
            result_desc: callback.result_desc,
        });
    }

    let metadata = callback
        .callback_metadata
        .ok_or(CallbackParseError::MissingField("CallbackMetadata"))?;

    let amount = metadata
        .get("Amount")
        .ok_or(CallbackParseError::MissingField("Amount"))?;
    let amount_minor = json_amount_to_minor(amount).ok_or_else(|| {
        CallbackParseError::InvalidField {
            field: "Amount",
            reason: amount.to_string(),
        }
    })?;

    let receipt = metadata
        .get("MpesaReceiptNumber")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(CallbackParseError::MissingField("MpesaReceiptNumber"))?
        .to_string();

    let phone = match metadata.get("PhoneNumber") {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(CallbackParseError::MissingField("PhoneNumber")),
    };

    Ok(MpesaStkResult::Paid {
        checkout_request_id: callback.checkout_request_id,
        amount_minor,
        receipt,
        phone,
    })
}

/// Converts a JSON number or numeric string in major units to minor units.
fn json_amount_to_minor(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(whole) = n.as_i64() {
                whole.checked_mul(100).filter(|v| *v > 0)
            } else {
                let f = n.as_f64()?;
                let minor = (f * 100.0).round();
                (minor > 0.0 && minor < i64::MAX as f64).then_some(minor as i64)
            }
        }
        serde_json::Value::String(s) => {
            shared::validation::parse_decimal_minor(s).filter(|v| *v > 0)
        }
        _ => None,
    }
}

// PayPal order wire format (v2 checkout orders).

/// A PayPal order as returned by the orders API.
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PaypalPurchaseUnit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalPurchaseUnit {
    pub reference_id: Option<String>,
    pub custom_id: Option<String>,
    pub amount: Option<PaypalAmount>,
    pub payments: Option<PaypalPayments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalAmount {
    pub currency_code: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalPayments {
    #[serde(default)]
    pub captures: Vec<PaypalCapture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalCapture {
    pub id: String,
    pub status: String,
    pub amount: Option<PaypalAmount>,
}

/// Status value that is the sole trigger for approving a PayPal payment.
pub const PAYPAL_COMPLETED: &str = "COMPLETED";

/// A parsed PayPal order outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaypalOrderEvent {
    pub order_id: String,
    pub status: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub capture_id: Option<String>,
    pub reference_id: Option<String>,
}

impl PaypalOrderEvent {
    pub fn is_completed(&self) -> bool {
        self.status == PAYPAL_COMPLETED
    }
}

/// Parses a PayPal order body into a strict record.
pub fn parse_paypal_order(payload: &serde_json::Value) -> Result<PaypalOrderEvent, CallbackParseError> {
    let order: PaypalOrder = serde_json::from_value(payload.clone())
        .map_err(|e| CallbackParseError::Malformed(e.to_string()))?;
    PaypalOrderEvent::try_from(order)
}

impl TryFrom<PaypalOrder> for PaypalOrderEvent {
    type Error = CallbackParseError;

    fn try_from(order: PaypalOrder) -> Result<Self, Self::Error> {
        if order.id.trim().is_empty() {
            return Err(CallbackParseError::MissingField("id"));
        }

        let unit = order
            .purchase_units
            .first()
            .ok_or(CallbackParseError::MissingField("purchase_units"))?;

        let capture = unit
            .payments
            .as_ref()
            .and_then(|p| p.captures.first());

        // Captured amount wins over the requested amount when both exist.
        let amount = capture
            .and_then(|c| c.amount.as_ref())
            .or(unit.amount.as_ref())
            .ok_or(CallbackParseError::MissingField("amount"))?;

        let currency: Currency =
            amount
                .currency_code
                .parse()
                .map_err(|reason| CallbackParseError::InvalidField {
                    field: "currency_code",
                    reason,
                })?;

        let amount_minor = shared::validation::parse_decimal_minor(&amount.value)
            .filter(|v| *v > 0)
            .ok_or_else(|| CallbackParseError::InvalidField {
                field: "value",
                reason: amount.value.clone(),
            })?;

        Ok(Self {
            order_id: order.id,
            status: order.status.to_uppercase(),
            amount_minor,
            currency,
            capture_id: capture.map(|c| c.id.clone()),
            reference_id: unit.reference_id.clone().or_else(|| unit.custom_id.clone()),
        })
    }
}

/// A provider confirmation, tagged by channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    MobileMoney(MpesaStkResult),
    Paypal(PaypalOrderEvent),
}

impl ProviderEvent {
    pub fn method(&self) -> PaymentMethod {
        match self {
            ProviderEvent::MobileMoney(_) => PaymentMethod::MobileMoney,
            ProviderEvent::Paypal(_) => PaymentMethod::Paypal,
        }
    }

    /// Provider reference the ledger row is keyed by.
    pub fn reference(&self) -> &str {
        match self {
            ProviderEvent::MobileMoney(result) => result.checkout_request_id(),
            ProviderEvent::Paypal(order) => &order.order_id,
        }
    }

    pub fn signals_success(&self) -> bool {
        match self {
            ProviderEvent::MobileMoney(result) => matches!(result, MpesaStkResult::Paid { .. }),
            ProviderEvent::Paypal(order) => order.is_completed(),
        }
    }

    /// Amount the provider says was paid, when it reports one.
    pub fn confirmed_amount(&self) -> Option<(i64, Currency)> {
        match self {
            ProviderEvent::MobileMoney(MpesaStkResult::Paid { amount_minor, .. }) => {
                Some((*amount_minor, Currency::Kes))
            }
            ProviderEvent::MobileMoney(MpesaStkResult::Failed { .. }) => None,
            ProviderEvent::Paypal(order) => Some((order.amount_minor, order.currency)),
        }
    }

    /// Provider-side receipt or capture id.
    pub fn receipt(&self) -> Option<&str> {
        match self {
            ProviderEvent::MobileMoney(MpesaStkResult::Paid { receipt, .. }) => Some(receipt),
            ProviderEvent::MobileMoney(MpesaStkResult::Failed { .. }) => None,
            ProviderEvent::Paypal(order) => order.capture_id.as_deref(),
        }
    }

    /// Reason to record when the provider reports a definitive failure.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            ProviderEvent::MobileMoney(MpesaStkResult::Failed {
                result_code,
                result_desc,
                ..
            }) => Some(format!("mpesa_{}: {}", result_code, result_desc)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mpesa_success() -> serde_json::Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            {"Name": "Amount", "Value": 833.00},
                            {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                            {"Name": "Balance"},
                            {"Name": "TransactionDate", "Value": 20191219102115_i64},
                            {"Name": "PhoneNumber", "Value": 254708374149_i64}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_mpesa_success() {
        let result = parse_mpesa_callback(&mpesa_success()).unwrap();
        assert_eq!(
            result,
            MpesaStkResult::Paid {
                checkout_request_id: "ws_CO_191220191020363925".to_string(),
                amount_minor: 83_300,
                receipt: "NLJ7RT61SV".to_string(),
                phone: "254708374149".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_mpesa_integer_amount() {
        let mut payload = mpesa_success();
        payload["Body"]["stkCallback"]["CallbackMetadata"]["Item"][0]["Value"] = json!(833);
        match parse_mpesa_callback(&payload).unwrap() {
            MpesaStkResult::Paid { amount_minor, .. } => assert_eq!(amount_minor, 83_300),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_mpesa_cancelled() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "8555-67195-1",
                    "CheckoutRequestID": "ws_CO_27072017151044001",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        });
        let result = parse_mpesa_callback(&payload).unwrap();
        assert_eq!(
            result,
            MpesaStkResult::Failed {
                checkout_request_id: "ws_CO_27072017151044001".to_string(),
                result_code: 1032,
                result_desc: "Request cancelled by user".to_string(),
            }
        );

        let event = ProviderEvent::MobileMoney(result);
        assert!(!event.signals_success());
        assert_eq!(
            event.failure_reason().unwrap(),
            "mpesa_1032: Request cancelled by user"
        );
    }

    #[test]
    fn test_parse_mpesa_missing_envelope_rejected() {
        let err = parse_mpesa_callback(&json!({"foo": "bar"})).unwrap_err();
        assert!(matches!(err, CallbackParseError::Malformed(_)));
    }

    #[test]
    fn test_parse_mpesa_success_without_receipt_rejected() {
        let mut payload = mpesa_success();
        payload["Body"]["stkCallback"]["CallbackMetadata"]["Item"]
            .as_array_mut()
            .unwrap()
            .remove(1);
        assert_eq!(
            parse_mpesa_callback(&payload).unwrap_err(),
            CallbackParseError::MissingField("MpesaReceiptNumber")
        );
    }

    #[test]
    fn test_parse_mpesa_success_without_metadata_rejected() {
        let mut payload = mpesa_success();
        payload["Body"]["stkCallback"]
            .as_object_mut()
            .unwrap()
            .remove("CallbackMetadata");
        assert_eq!(
            parse_mpesa_callback(&payload).unwrap_err(),
            CallbackParseError::MissingField("CallbackMetadata")
        );
    }

    #[test]
    fn test_parse_mpesa_string_result_code_rejected() {
        let mut payload = mpesa_success();
        payload["Body"]["stkCallback"]["ResultCode"] = json!("0");
        assert!(parse_mpesa_callback(&payload).is_err());
    }

    fn paypal_completed() -> serde_json::Value {
        json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{
                "reference_id": "Daily Package",
                "amount": {"currency_code": "USD", "value": "6.50"},
                "payments": {
                    "captures": [{
                        "id": "3C679366HH908993F",
                        "status": "COMPLETED",
                        "amount": {"currency_code": "USD", "value": "6.50"}
                    }]
                }
            }]
        })
    }

    #[test]
    fn test_parse_paypal_completed() {
        let order = parse_paypal_order(&paypal_completed()).unwrap();
        assert!(order.is_completed());
        assert_eq!(order.amount_minor, 650);
        assert_eq!(order.currency, Currency::Usd);
        assert_eq!(order.capture_id.as_deref(), Some("3C679366HH908993F"));
        assert_eq!(order.reference_id.as_deref(), Some("Daily Package"));

        let event = ProviderEvent::Paypal(order);
        assert!(event.signals_success());
        assert_eq!(event.reference(), "5O190127TN364715T");
        assert_eq!(event.method(), PaymentMethod::Paypal);
        assert_eq!(event.confirmed_amount(), Some((650, Currency::Usd)));
    }

    #[test]
    fn test_parse_paypal_created_order_not_success() {
        let payload = json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "purchase_units": [{
                "amount": {"currency_code": "USD", "value": "6.50"}
            }]
        });
        let event = ProviderEvent::Paypal(parse_paypal_order(&payload).unwrap());
        assert!(!event.signals_success());
        assert!(event.receipt().is_none());
    }

    #[test]
    fn test_parse_paypal_approved_is_not_completed() {
        let mut payload = paypal_completed();
        payload["status"] = json!("APPROVED");
        assert!(!parse_paypal_order(&payload).unwrap().is_completed());
    }

    #[test]
    fn test_parse_paypal_without_units_rejected() {
        let payload = json!({"id": "X", "status": "COMPLETED"});
        assert_eq!(
            parse_paypal_order(&payload).unwrap_err(),
            CallbackParseError::MissingField("purchase_units")
        );
    }

    #[test]
    fn test_parse_paypal_unsupported_currency_rejected() {
        let mut payload = paypal_completed();
        payload["purchase_units"][0]["payments"]["captures"][0]["amount"]["currency_code"] =
            json!("EUR");
        assert!(matches!(
            parse_paypal_order(&payload).unwrap_err(),
            CallbackParseError::InvalidField {
                field: "currency_code",
                ..
            }
        ));
    }
}
