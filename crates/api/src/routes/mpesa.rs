//! M-Pesa STK push and callback endpoints.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use domain::models::package;
use domain::models::payment::PaymentResponse;
use domain::models::{Currency, PaymentMethod};
use domain::services::{parse_mpesa_callback, MpesaStkResult, PollPolicy, ProviderEvent};
use persistence::repositories::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::crypto::secrets_match;
use shared::validation::{normalize_email, normalize_msisdn};
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{
    record_payment_submitted, record_payment_transition, record_provider_callback,
};
use crate::services::{PaymentError, ProviderOutcome};

/// Request body for initiating an STK push.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StkPushRequest {
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_msisdn"))]
    pub phone: String,

    #[serde(default, alias = "email")]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,

    #[serde(default, alias = "package")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub package_name: String,
}

/// Response after the STK prompt was sent to the phone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StkPushResponse {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub customer_message: String,
    pub payment: PaymentResponse,
    /// How the client should poll `/api/payments/status`.
    pub poll: PollPolicy,
}

/// Query carried by the callback URL registered with Daraja.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
}

/// Acknowledgement Daraja expects once a callback was received.
fn callback_ack() -> Json<Value> {
    Json(json!({"ResultCode": 0, "ResultDesc": "Accepted"}))
}

/// Prompt the user's phone to pay for a package.
///
/// POST /api/mpesa/stkpush
pub async fn stk_push(
    State(state): State<AppState>,
    Json(request): Json<StkPushRequest>,
) -> Result<Json<StkPushResponse>, ApiError> {
    request.validate()?;

    let package = package::resolve(&request.package_name)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let phone = normalize_msisdn(&request.phone)
        .ok_or_else(|| ApiError::Validation("phone must be a Kenyan mobile number".to_string()))?;
    let email = normalize_email(&request.user_email);

    if UserRepository::new(state.pool.clone())
        .find_by_email(&email)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let ack = state
        .mpesa
        .initiate_stk_push(&phone, package.price_kes, package.name, package.name)
        .await?;

    let payload = serde_json::to_value(&ack).unwrap_or(Value::Null);
    let payment = state
        .payments
        .record_provider_request(
            PaymentMethod::MobileMoney,
            &ack.checkout_request_id,
            &email,
            package,
            Currency::Kes,
            Some(phone),
            payload,
        )
        .await?;
    record_payment_submitted(PaymentMethod::MobileMoney.as_str());

    Ok(Json(StkPushResponse {
        checkout_request_id: ack.checkout_request_id,
        merchant_request_id: ack.merchant_request_id,
        customer_message: ack.customer_message,
        payment: payment.into(),
        poll: state.payments.poll_policy(),
    }))
}

/// Result callback from Daraja.
///
/// POST /api/mpesa/callback?token=<callback token>
///
/// Any parsed payload is acknowledged so Daraja stops retrying; only storage
/// failures surface as errors.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let token = query.token.unwrap_or_default();
    if !secrets_match(&state.config.mpesa.callback_token, &token) {
        warn!("M-Pesa callback with invalid token rejected");
        return Err(ApiError::Unauthorized("Invalid callback token".to_string()));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Malformed callback body: {}", e)))?;
    let result = parse_mpesa_callback(&payload).map_err(|e| {
        record_provider_callback("mpesa", "malformed");
        ApiError::Validation(e.to_string())
    })?;

    let checkout_request_id = result.checkout_request_id().to_string();
    record_provider_callback(
        "mpesa",
        match result {
            MpesaStkResult::Paid { .. } => "paid",
            MpesaStkResult::Failed { .. } => "failed",
        },
    );

    let payment = match state
        .payments
        .find_provider_payment(PaymentMethod::MobileMoney, &checkout_request_id)
        .await?
    {
        Some(payment) => payment,
        None => {
            warn!(checkout_request_id = %checkout_request_id, "Callback for unknown checkout request");
            return Ok(callback_ack());
        }
    };

    let event = ProviderEvent::MobileMoney(result);
    match state
        .payments
        .apply_provider_event(payment.id, &event, &payload)
        .await
    {
        Ok(ProviderOutcome::Approved(outcome)) => {
            if outcome.newly_approved {
                record_payment_transition(PaymentMethod::MobileMoney.as_str(), "approved");
            }
            info!(
                payment_id = %payment.id,
                expiry_at = %outcome.expiry_at,
                "M-Pesa payment confirmed"
            );
        }
        Ok(ProviderOutcome::Rejected(outcome)) => {
            if outcome.newly_rejected {
                record_payment_transition(PaymentMethod::MobileMoney.as_str(), "failed");
            }
            info!(payment_id = %payment.id, "M-Pesa payment failed");
        }
        Ok(ProviderOutcome::Pending(_)) => {}
        Err(
            e @ (PaymentError::AlreadyProcessed(_)
            | PaymentError::Validation(_)
            | PaymentError::NotFound(_)),
        ) => {
            warn!(payment_id = %payment.id, error = %e, "M-Pesa callback not applied");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(callback_ack())
}
