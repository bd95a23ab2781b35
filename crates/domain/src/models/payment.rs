//! Payment ledger domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::package::Currency;

/// Lifecycle status of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Expired,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Every status other than `pending` is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel a payment arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Manual,
    #[serde(alias = "mobile-money", alias = "mpesa", alias = "m-pesa")]
    MobileMoney,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Manual => "manual",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who created a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOrigin {
    /// Submitted by the user and confirmed by an admin.
    Client,
    /// Created around an outbound provider request or an inbound provider push.
    Provider,
}

impl std::fmt::Display for PaymentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOrigin::Client => write!(f, "client"),
            PaymentOrigin::Provider => write!(f, "provider"),
        }
    }
}

/// Failure reason recorded when a provider-confirmed amount does not match the catalog.
pub const FAILURE_AMOUNT_MISMATCH: &str = "amount_mismatch";

/// A payment ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Payment {
    pub id: Uuid,
    pub user_email: String,
    pub method: PaymentMethod,
    pub origin: PaymentOrigin,
    pub amount_minor: i64,
    pub currency: Currency,
    pub phone: Option<String>,
    pub counterparty_reference: String,
    pub idempotency_key: Option<String>,
    pub package_name: String,
    pub duration_hours: i64,
    pub status: PaymentStatus,
    pub failure_reason: Option<String>,
    pub provider_receipt: Option<String>,
    pub raw_provider_payload: Option<serde_json::Value>,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new pending ledger row.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_email: String,
    pub method: PaymentMethod,
    pub origin: PaymentOrigin,
    pub amount_minor: i64,
    pub currency: Currency,
    pub phone: Option<String>,
    pub counterparty_reference: String,
    pub idempotency_key: Option<String>,
    pub package_name: String,
    pub duration_hours: i64,
    pub raw_provider_payload: Option<serde_json::Value>,
}

/// Request payload for a manual (user-confirmed) payment.
///
/// `amount` is in whole shillings.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitManualPaymentRequest {
    #[serde(default)]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,

    #[serde(default)]
    pub method: Option<PaymentMethod>,

    #[validate(custom(function = "shared::validation::validate_msisdn"))]
    pub phone: Option<String>,

    /// Transaction code quoted by the user.
    #[serde(default, alias = "tx_code")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 64, message = "Reference must be at most 64 characters"))]
    pub counterparty_reference: String,

    #[validate(required(message = "amount is required"))]
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: Option<i64>,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub package_name: String,

    #[serde(alias = "duration")]
    pub duration_hours: Option<i64>,
}

/// Request payload to approve a pending payment.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovePaymentRequest {
    pub id: Uuid,
}

/// Request payload to reject a pending payment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectPaymentRequest {
    pub id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Reason must be between 1 and 255 characters"))]
    pub reason: String,
}

/// Query for polling payment status.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusQuery {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub attempt: Option<u32>,
}

/// Ledger row as exposed over the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub user_email: String,
    pub method: PaymentMethod,
    pub amount: String,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub counterparty_reference: String,
    pub package_name: String,
    pub duration_hours: i64,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            user_email: payment.user_email,
            method: payment.method,
            amount: shared::validation::format_minor(payment.amount_minor),
            currency: payment.currency,
            phone: payment.phone,
            counterparty_reference: payment.counterparty_reference,
            package_name: payment.package_name,
            duration_hours: payment.duration_hours,
            status: payment.status,
            failure_reason: payment.failure_reason,
            approved_by: payment.approved_by,
            created_at: payment.created_at,
            approved_at: payment.approved_at,
        }
    }
}

/// Response for listing pending payments.
#[derive(Debug, Clone, Serialize)]
pub struct ListPendingResponse {
    pub payments: Vec<PaymentResponse>,
    pub total: usize,
}

/// Response after approving a payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApprovalResponse {
    pub payment: PaymentResponse,
    pub expiry_at: DateTime<Utc>,
    /// False when the payment had already been approved.
    pub newly_approved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> serde_json::Value {
        json!({
            "user_email": "user@example.com",
            "phone": "0712345678",
            "tx_code": "QWE123RTY",
            "amount": 833,
            "package_name": "Daily Package",
            "duration": 24
        })
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(PaymentStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_status_terminal() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Expired.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_method_aliases() {
        let method: PaymentMethod = serde_json::from_str("\"mobile-money\"").unwrap();
        assert_eq!(method, PaymentMethod::MobileMoney);
        let method: PaymentMethod = serde_json::from_str("\"mpesa\"").unwrap();
        assert_eq!(method, PaymentMethod::MobileMoney);
        assert_eq!(PaymentMethod::Paypal.to_string(), "paypal");
    }

    #[test]
    fn test_submit_request_accepts_legacy_field_names() {
        let request: SubmitManualPaymentRequest =
            serde_json::from_value(valid_request()).unwrap();
        assert_eq!(request.counterparty_reference, "QWE123RTY");
        assert_eq!(request.duration_hours, Some(24));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_submit_request_missing_amount_fails_validation() {
        let mut body = valid_request();
        body.as_object_mut().unwrap().remove("amount");
        let request: SubmitManualPaymentRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount"));
    }

    #[test]
    fn test_submit_request_non_positive_amount_fails_validation() {
        let mut body = valid_request();
        body["amount"] = json!(0);
        let request: SubmitManualPaymentRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_submit_request_missing_reference_fails_validation() {
        let mut body = valid_request();
        body.as_object_mut().unwrap().remove("tx_code");
        let request: SubmitManualPaymentRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("counterparty_reference"));
    }

    #[test]
    fn test_submit_request_missing_email_fails_validation() {
        let mut body = valid_request();
        body.as_object_mut().unwrap().remove("user_email");
        let request: SubmitManualPaymentRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_email"));
    }

    #[test]
    fn test_submit_request_bad_phone_fails_validation() {
        let mut body = valid_request();
        body["phone"] = json!("N/A");
        let request: SubmitManualPaymentRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone"));
    }

    #[test]
    fn test_status_query_ref_rename() {
        let query: PaymentStatusQuery =
            serde_json::from_value(json!({"ref": "ws_CO_123", "attempt": 3})).unwrap();
        assert_eq!(query.reference.as_deref(), Some("ws_CO_123"));
        assert_eq!(query.attempt, Some(3));
    }

    #[test]
    fn test_payment_response_formats_amount() {
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            user_email: "user@example.com".to_string(),
            method: PaymentMethod::Manual,
            origin: PaymentOrigin::Client,
            amount_minor: 83_300,
            currency: Currency::Kes,
            phone: None,
            counterparty_reference: "QWE123".to_string(),
            idempotency_key: None,
            package_name: "Daily Package".to_string(),
            duration_hours: 24,
            status: PaymentStatus::Pending,
            failure_reason: None,
            provider_receipt: None,
            raw_provider_payload: None,
            approved_by: None,
            created_at: now,
            approved_at: None,
            updated_at: now,
        };

        let json = serde_json::to_value(PaymentResponse::from(payment)).unwrap();
        assert_eq!(json["amount"], "833.00");
        assert_eq!(json["currency"], "KES");
        assert!(json.get("approved_at").is_none());
    }
}
