//! Admin session endpoints.

use axum::{extract::State, http::StatusCode, Extension, Json};
use domain::models::admin::{AdminLoginRequest, AdminTokenResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::AdminIdentity;

/// Exchange the admin credentials for a session token.
///
/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AdminTokenResponse>, ApiError> {
    let issued = state
        .admin_gate
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(AdminTokenResponse::bearer(issued.token, issued.expires_at)))
}

/// Revoke the current session.
///
/// POST /api/admin/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> Result<StatusCode, ApiError> {
    state.admin_gate.logout(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the current session token with a fresh one.
///
/// POST /api/admin/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> Result<Json<AdminTokenResponse>, ApiError> {
    let issued = state.admin_gate.refresh(&identity).await?;
    Ok(Json(AdminTokenResponse::bearer(issued.token, issued.expires_at)))
}
