use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::TextGenerator;
use shared::session::SessionTokens;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    admin, assessments, chat, health, mood, mpesa, packages, payments, paypal, subscription,
    users,
};
use crate::services::{AdminGate, MpesaClient, PaymentService, PaypalClient};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub payments: PaymentService,
    pub admin_gate: AdminGate,
    pub mpesa: Arc<MpesaClient>,
    pub paypal: Arc<PaypalClient>,
    pub text_generator: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Builds the state, constructing provider clients from configuration.
    pub fn new(
        config: Config,
        pool: PgPool,
        text_generator: Arc<dyn TextGenerator>,
    ) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        // Rate limiting is disabled when rate_limit_per_minute is 0
        let rate_limiter = (config.security.rate_limit_per_minute > 0)
            .then(|| {
                Arc::new(RateLimiterState::new(
                    config.security.rate_limit_per_minute,
                    config.security.trust_forwarded_for,
                ))
            });

        let session_tokens = if config.admin.session_secret.is_empty() {
            None
        } else {
            Some(Arc::new(SessionTokens::new(
                &config.admin.session_secret,
                config.admin.session_lifetime_secs,
                config.admin.leeway_secs,
            )?))
        };

        let timeout_secs = config.payments.provider_timeout_secs;

        Ok(Self {
            payments: PaymentService::new(pool.clone()),
            admin_gate: AdminGate::new(pool.clone(), &config.admin, session_tokens),
            mpesa: Arc::new(MpesaClient::new(config.mpesa.clone(), timeout_secs)?),
            paypal: Arc::new(PaypalClient::new(config.paypal.clone(), timeout_secs)?),
            text_generator,
            rate_limiter,
            config,
            pool,
        })
    }
}

/// Builds the router around prepared state.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Development: allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Admin routes (require a live admin session)
    let admin_routes = Router::new()
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/refresh", post(admin::refresh))
        .route("/api/payments/pending", get(payments::list_pending))
        .route("/api/payments/approve", post(payments::approve))
        .route("/api/payments/reject", post(payments::reject))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public API routes, rate limited per client
    let api_routes = Router::new()
        .route("/api/packages", get(packages::list_packages))
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/admin/login", post(admin::login))
        .route("/api/payments/manual", post(payments::submit_manual))
        .route("/api/payments/status", get(payments::status))
        .route("/api/subscription/check", post(subscription::check))
        .route("/api/mpesa/stkpush", post(mpesa::stk_push))
        .route("/api/mpesa/callback", post(mpesa::callback))
        .route("/api/paypal/create-order", post(paypal::create_order))
        .route("/api/paypal/capture-order", post(paypal::capture_order))
        .route("/api/paypal/verify", post(paypal::verify_order))
        .route("/api/mood", post(mood::log_mood))
        .route("/api/mood/:email", get(mood::recent_moods))
        .route("/api/insights/:email", get(mood::insights))
        .route("/api/stats/mood-distribution", get(mood::distribution))
        .route("/api/stats/monthly-users", get(chat::monthly_activity))
        .route("/api/report/:email", get(mood::report))
        .route("/api/chat/start-session", post(chat::start_session))
        .route("/api/chat/sessions/:email", get(chat::list_sessions))
        .route("/api/chat/history/:session_id", get(chat::history))
        .route("/api/chat", post(chat::send_message))
        .route("/api/guided-meditation", post(chat::guided_meditation))
        .route("/api/assessments", post(assessments::submit))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Probes and metrics are never rate limited
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
