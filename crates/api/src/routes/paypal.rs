//! PayPal order endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use domain::models::package::{self, Package};
use domain::models::payment::PaymentResponse;
use domain::models::{Currency, Payment, PaymentMethod};
use domain::services::{parse_paypal_order, PaypalOrderEvent, PollPolicy, ProviderEvent};
use persistence::repositories::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::validation::normalize_email;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{
    record_payment_submitted, record_payment_transition, record_provider_callback,
};
use crate::services::{ProviderError, ProviderOutcome};

/// Request body for creating an order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[serde(default, alias = "email")]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,

    #[serde(default, alias = "package")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub package_name: String,
}

/// Request body for capturing an order created through this API.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CaptureOrderRequest {
    #[serde(default, alias = "orderID")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub order_id: String,
}

/// Request body for verifying an order created client-side.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyOrderRequest {
    #[serde(default, alias = "orderID")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub order_id: String,

    #[serde(default, alias = "email")]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,

    #[serde(default, alias = "package")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub package_name: String,
}

/// Order state after a PayPal call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaypalOrderResponse {
    pub order_id: String,
    /// PayPal's order status, e.g. `CREATED` or `COMPLETED`.
    pub status: String,
    pub payment: PaymentResponse,
    /// Link the buyer follows to approve a newly created order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollPolicy>,
}

fn parse_order(payload: &Value) -> Result<PaypalOrderEvent, ApiError> {
    parse_paypal_order(payload).map_err(|e| {
        ApiError::from(ProviderError::InvalidResponse {
            provider: "PayPal",
            reason: e.to_string(),
        })
    })
}

/// The `approve` HATEOAS link of an order, if present.
fn approve_link(order: &Value) -> Option<String> {
    order["links"].as_array()?.iter().find_map(|link| {
        (link["rel"] == "approve")
            .then(|| link["href"].as_str().map(str::to_string))
            .flatten()
    })
}

async fn require_user(state: &AppState, email: &str) -> Result<(), ApiError> {
    match UserRepository::new(state.pool.clone())
        .find_by_email(email)
        .await?
    {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

fn resolve_package(name: &str) -> Result<&'static Package, ApiError> {
    package::resolve(name).map_err(|e| ApiError::Validation(e.to_string()))
}

fn order_response(
    event: &PaypalOrderEvent,
    outcome: ProviderOutcome,
) -> PaypalOrderResponse {
    let (payment, expiry_at): (Payment, _) = match outcome {
        ProviderOutcome::Approved(approval) => {
            if approval.newly_approved {
                record_payment_transition(PaymentMethod::Paypal.as_str(), "approved");
            }
            (approval.payment, Some(approval.expiry_at))
        }
        ProviderOutcome::Rejected(rejection) => {
            if rejection.newly_rejected {
                record_payment_transition(PaymentMethod::Paypal.as_str(), "failed");
            }
            (rejection.payment, None)
        }
        ProviderOutcome::Pending(payment) => (payment, None),
    };

    PaypalOrderResponse {
        order_id: event.order_id.clone(),
        status: event.status.clone(),
        payment: payment.into(),
        approve_url: None,
        expiry_at,
        poll: None,
    }
}

/// Create a PayPal order for a package's USD price.
///
/// POST /api/paypal/create-order
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<PaypalOrderResponse>, ApiError> {
    request.validate()?;

    let package = resolve_package(&request.package_name)?;
    let email = normalize_email(&request.user_email);
    require_user(&state, &email).await?;

    let order = state.paypal.create_order(package, &email).await?;
    let event = parse_order(&order)?;
    let approve_url = approve_link(&order);

    let payment = state
        .payments
        .record_provider_request(
            PaymentMethod::Paypal,
            &event.order_id,
            &email,
            package,
            Currency::Usd,
            None,
            order,
        )
        .await?;
    record_payment_submitted(PaymentMethod::Paypal.as_str());

    Ok(Json(PaypalOrderResponse {
        order_id: event.order_id,
        status: event.status,
        payment: payment.into(),
        approve_url,
        expiry_at: None,
        poll: Some(state.payments.poll_policy()),
    }))
}

/// Capture an order the buyer approved.
///
/// POST /api/paypal/capture-order
pub async fn capture_order(
    State(state): State<AppState>,
    Json(request): Json<CaptureOrderRequest>,
) -> Result<Json<PaypalOrderResponse>, ApiError> {
    request.validate()?;
    let order_id = request.order_id.trim();

    // Only orders recorded by create-order can be captured here.
    let payment = state
        .payments
        .find_provider_payment(PaymentMethod::Paypal, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    let order = state.paypal.capture_order(order_id).await?;
    let event = parse_order(&order)?;
    record_provider_callback("paypal", if event.is_completed() { "completed" } else { "incomplete" });

    let outcome = state
        .payments
        .apply_provider_event(payment.id, &ProviderEvent::Paypal(event.clone()), &order)
        .await?;

    info!(payment_id = %payment.id, status = %event.status, "PayPal order captured");
    Ok(Json(order_response(&event, outcome)))
}

/// Verify an order the client created and captured itself.
///
/// POST /api/paypal/verify
pub async fn verify_order(
    State(state): State<AppState>,
    Json(request): Json<VerifyOrderRequest>,
) -> Result<Json<PaypalOrderResponse>, ApiError> {
    request.validate()?;

    let package = resolve_package(&request.package_name)?;
    let email = normalize_email(&request.user_email);
    require_user(&state, &email).await?;

    let order = state.paypal.get_order(request.order_id.trim()).await?;
    let event = parse_order(&order)?;
    record_provider_callback("paypal", if event.is_completed() { "completed" } else { "incomplete" });

    let provider_event = ProviderEvent::Paypal(event.clone());
    let outcome = match state
        .payments
        .find_provider_payment(PaymentMethod::Paypal, &event.order_id)
        .await?
    {
        Some(existing) => {
            state
                .payments
                .apply_provider_event(existing.id, &provider_event, &order)
                .await?
        }
        None => {
            record_payment_submitted(PaymentMethod::Paypal.as_str());
            state
                .payments
                .record_provider_push(&provider_event, &email, package, &order)
                .await?
        }
    };

    info!(order_id = %event.order_id, status = %event.status, "PayPal order verified");
    Ok(Json(order_response(&event, outcome)))
}
