//! Payment ledger endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use domain::models::payment::{
    ApprovalResponse, ApprovePaymentRequest, ListPendingResponse, PaymentResponse,
    PaymentStatusQuery, RejectPaymentRequest, SubmitManualPaymentRequest,
};
use domain::services::{ApprovalActor, PaymentStatusResponse};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OptionalIdempotencyKey;
use crate::middleware::metrics::{record_payment_submitted, record_payment_transition};
use crate::services::AdminIdentity;

/// Submit a payment the user made outside the app, for admin confirmation.
///
/// POST /api/payments/manual
///
/// Replaying the same `Idempotency-Key` returns the original row with 200.
pub async fn submit_manual(
    State(state): State<AppState>,
    idempotency_key: OptionalIdempotencyKey,
    Json(request): Json<SubmitManualPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    request.validate()?;

    let (payment, created) = state
        .payments
        .submit_manual(request, idempotency_key.hash())
        .await?;

    if created {
        record_payment_submitted(payment.method.as_str());
        Ok((StatusCode::CREATED, Json(payment.into())))
    } else {
        Ok((StatusCode::OK, Json(payment.into())))
    }
}

/// List payments awaiting a decision.
///
/// GET /api/payments/pending
pub async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<ListPendingResponse>, ApiError> {
    let payments: Vec<PaymentResponse> = state
        .payments
        .list_pending()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListPendingResponse {
        total: payments.len(),
        payments,
    }))
}

/// Approve a pending payment and extend the user's subscription.
///
/// POST /api/payments/approve
pub async fn approve(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Json(request): Json<ApprovePaymentRequest>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let actor = ApprovalActor::Admin { email: admin.email };
    let outcome = state.payments.approve(request.id, &actor, None).await?;

    if outcome.newly_approved {
        record_payment_transition(outcome.payment.method.as_str(), "approved");
    }

    Ok(Json(ApprovalResponse {
        payment: outcome.payment.into(),
        expiry_at: outcome.expiry_at,
        newly_approved: outcome.newly_approved,
    }))
}

/// Reject a pending payment.
///
/// POST /api/payments/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Json(request): Json<RejectPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    request.validate()?;

    let actor = ApprovalActor::Admin { email: admin.email };
    let outcome = state
        .payments
        .reject(request.id, &actor, request.reason.trim(), None)
        .await?;

    if outcome.newly_rejected {
        record_payment_transition(outcome.payment.method.as_str(), "failed");
    }
    Ok(Json(outcome.payment.into()))
}

/// Poll the status of a payment by provider reference, transaction code or
/// idempotency key.
///
/// GET /api/payments/status?ref=<reference>&attempt=<n>
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<PaymentStatusQuery>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let reference = query
        .reference
        .ok_or_else(|| ApiError::Validation("ref query parameter is required".to_string()))?;

    let response = state
        .payments
        .check_status(&reference, query.attempt)
        .await?;

    Ok(Json(response))
}
