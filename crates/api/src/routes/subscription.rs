//! Subscription check endpoint.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::subscription::CheckSubscriptionRequest;
use domain::models::SubscriptionCheck;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Whether a user currently holds an active package.
///
/// POST /api/subscription/check
pub async fn check(
    State(state): State<AppState>,
    Json(request): Json<CheckSubscriptionRequest>,
) -> Result<Json<SubscriptionCheck>, ApiError> {
    request.validate()?;

    let check = state
        .payments
        .check_active(&request.email, Utc::now())
        .await?;

    Ok(Json(check))
}
