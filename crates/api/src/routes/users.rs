//! User registration and login.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use domain::models::user::{
    LoginRequest, LoginResponse, RegisterRequest, UserResponse, DEFAULT_DISPLAY_NAME,
};
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::password::{check_password_policy, hash_password, verify_password};
use shared::validation::{normalize_email, normalize_msisdn};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register a new user.
///
/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;
    check_password_policy(&request.password).map_err(|e| ApiError::Validation(e.to_string()))?;

    let email = normalize_email(&request.email);
    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME);
    let phone = request.phone.as_deref().and_then(normalize_msisdn);

    let password_hash =
        hash_password(&request.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user: User = UserRepository::new(state.pool.clone())
        .create_user(&email, &password_hash, display_name, phone.as_deref())
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already registered".to_string()),
            other => other,
        })?
        .into();

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in with email and password.
///
/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let entity = UserRepository::new(state.pool.clone())
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let valid = verify_password(&request.password, &entity.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let subscription = state.payments.check_active(&email, Utc::now()).await?;
    let user: User = entity.into();

    Ok(Json(LoginResponse {
        user: user.into(),
        has_package: subscription.active,
        package: subscription.package,
        expiry_at: subscription.expiry_at,
    }))
}
