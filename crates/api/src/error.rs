use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::admin_gate::AdminAuthError;
use crate::services::payments::PaymentError;
use crate::services::providers::ProviderError;

/// Message returned for every upstream provider failure. Details are only logged.
pub const UPSTREAM_MESSAGE: &str = "Payment could not be confirmed, please try again";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::AlreadyProcessed(msg) => {
                (StatusCode::CONFLICT, "already_processed", msg.clone())
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Upstream(msg) => {
                tracing::warn!("Upstream provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, "upstream_error", UPSTREAM_MESSAGE.into())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();

        ApiError::Validation(messages.join(", "))
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(provider) => {
                ApiError::ServiceUnavailable(format!("{} payments are not configured", provider))
            }
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => ApiError::Validation(msg),
            PaymentError::NotFound(msg) => ApiError::NotFound(msg),
            PaymentError::AlreadyProcessed(status) => {
                ApiError::AlreadyProcessed(format!("Payment is already {}", status))
            }
            PaymentError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            PaymentError::UpstreamProvider(provider_err) => provider_err.into(),
            PaymentError::Storage(db_err) => db_err.into(),
        }
    }
}

impl From<AdminAuthError> for ApiError {
    fn from(err: AdminAuthError) -> Self {
        match err {
            AdminAuthError::NotConfigured => {
                ApiError::ServiceUnavailable("Admin login is not configured".into())
            }
            AdminAuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".into())
            }
            AdminAuthError::InvalidSession => {
                ApiError::Unauthorized("Invalid or expired admin session".into())
            }
            AdminAuthError::Token(e) => ApiError::Internal(e.to_string()),
            AdminAuthError::Database(e) => e.into(),
        }
    }
}
