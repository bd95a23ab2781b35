//! Admin authentication middleware.
//!
//! Accepts the session token as `Authorization: Bearer <token>` or in the
//! `X-Admin-Token` header.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::AdminAuthError;

/// Alternate header carrying the admin session token.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Extracts the admin token from the request headers.
pub fn admin_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer
        .or_else(|| {
            headers
                .get(ADMIN_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|t| !t.is_empty())
}

/// Middleware for admin-only routes.
///
/// Rejects the request with 401 before the handler runs unless the token maps
/// to a live admin session. The [`AdminIdentity`](crate::services::AdminIdentity)
/// is stored in request extensions for the handler.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match admin_token(req.headers()) {
        Some(token) => token.to_string(),
        None => return unauthorized_response("Missing admin session token"),
    };

    match state.admin_gate.authenticate(&token).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(AdminAuthError::InvalidSession) | Err(AdminAuthError::NotConfigured) => {
            unauthorized_response("Invalid or expired admin session")
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
