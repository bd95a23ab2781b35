//! Common test utilities for integration tests.
//!
//! Tests run against the PostgreSQL database named by `TEST_DATABASE_URL`
//! and are skipped when it is unset. Every test works on its own freshly
//! registered user, so tests can share the database while running in parallel.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::services::MockTextGenerator;
use fake::{faker::name::en::Name, Fake};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use therapy_coach_api::{
    app::{router, AppState},
    config::{
        AdminConfig, Config, DatabaseConfig, LoggingConfig, MpesaConfig, PaymentsConfig,
        PaypalConfig, SecurityConfig, ServerConfig, TextGenerationConfig,
    },
};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@therapy-coach.test";
pub const ADMIN_PASSWORD: &str = "admin-password-for-tests";
pub const CALLBACK_TOKEN: &str = "callback-token-for-tests";
pub const MOCK_REPLY: &str = "Let's take a slow breath together.";
pub const USER_PASSWORD: &str = "calm-waters-42";

/// Connects to the test database and applies migrations, or returns `None`
/// when `TEST_DATABASE_URL` is not set.
pub async fn test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Test configuration: admin gate enabled, rate limiting off, providers unconfigured.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0,
            trust_forwarded_for: false,
        },
        admin: AdminConfig {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            session_secret: "integration-test-session-secret-0123456789".to_string(),
            session_lifetime_secs: 3600,
            leeway_secs: 0,
        },
        payments: PaymentsConfig::default(),
        mpesa: MpesaConfig {
            callback_token: CALLBACK_TOKEN.to_string(),
            ..MpesaConfig::default()
        },
        paypal: PaypalConfig::default(),
        text_generation: TextGenerationConfig::default(),
    }
}

/// Router over the test configuration with a mock text generator.
pub fn test_app(pool: PgPool) -> Router {
    let state = AppState::new(
        test_config(),
        pool,
        Arc::new(MockTextGenerator::replying(MOCK_REPLY)),
    )
    .expect("Failed to build app state");
    router(state)
}

pub fn unique_test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Unique manual transaction code.
pub fn unique_tx_code() -> String {
    format!("QK{}", &uuid::Uuid::new_v4().simple().to_string()[..8]).to_uppercase()
}

/// Sends a request and returns the status with the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            panic!(
                "Non-JSON response. Status: {}, Body: {:?}",
                status,
                String::from_utf8_lossy(&bytes)
            )
        })
    };

    (status, json)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), &[]).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, &[]).await
}

/// POST with an admin bearer token.
/// GET a non-JSON endpoint, returning the status, content type and body.
pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn admin_post(app: &Router, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let auth = format!("Bearer {}", token);
    send(app, Method::POST, uri, Some(body), &[("authorization", &auth)]).await
}

/// Registers a fresh user and returns their email.
pub async fn register_user(app: &Router) -> String {
    let email = unique_test_email();
    let name: String = Name().fake();
    let (status, body) = post_json(
        app,
        "/api/register",
        json!({
            "name": name,
            "email": email,
            "password": USER_PASSWORD,
            "phone": "0712345678"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    email
}

/// Logs in as the configured admin and returns the session token.
pub async fn admin_token(app: &Router) -> String {
    let (status, body) = post_json(
        app,
        "/api/admin/login",
        json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Submits a Daily Package manual payment and returns the payment id.
pub async fn submit_daily_payment(app: &Router, email: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/payments/manual",
        json!({
            "user_email": email,
            "phone": "0712345678",
            "tx_code": unique_tx_code(),
            "amount": 833,
            "package_name": "Daily Package",
            "duration": 24
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "submission failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}
