//! Admin authentication.
//!
//! Admins sign in with the single configured credential pair and receive a
//! signed session token. Only a hash of the token id is stored, which is
//! enough to revoke a session or rotate it once.

use chrono::Utc;
use domain::models::admin::AdminSession;
use persistence::repositories::AdminSessionRepository;
use shared::crypto::{secrets_match, sha256_hex};
use shared::session::{IssuedToken, SessionTokenError, SessionTokens};
use shared::validation::normalize_email;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AdminConfig;

/// Errors from admin authentication.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("Admin login is not configured")]
    NotConfigured,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session is invalid or has expired")]
    InvalidSession,

    #[error("Token error: {0}")]
    Token(#[from] SessionTokenError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An authenticated admin, attached to requests by the admin middleware.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub email: String,
    pub jti: String,
}

/// Issues, checks and revokes admin sessions.
#[derive(Clone)]
pub struct AdminGate {
    sessions: AdminSessionRepository,
    tokens: Option<Arc<SessionTokens>>,
    email: String,
    password: String,
}

impl AdminGate {
    pub fn new(pool: PgPool, config: &AdminConfig, tokens: Option<Arc<SessionTokens>>) -> Self {
        Self {
            sessions: AdminSessionRepository::new(pool),
            tokens,
            email: normalize_email(&config.email),
            password: config.password.clone(),
        }
    }

    fn tokens(&self) -> Result<&SessionTokens, AdminAuthError> {
        self.tokens.as_deref().ok_or(AdminAuthError::NotConfigured)
    }

    async fn record(&self, issued: &IssuedToken) -> Result<(), AdminAuthError> {
        self.sessions
            .create(
                &sha256_hex(&issued.jti),
                &self.email,
                issued.issued_at,
                issued.expires_at,
            )
            .await?;
        Ok(())
    }

    /// Checks the configured credentials and starts a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AdminAuthError> {
        let tokens = self.tokens()?;

        // Evaluate both comparisons so timing does not reveal which one failed.
        let email_ok = secrets_match(&self.email, &normalize_email(email));
        let password_ok = secrets_match(&self.password, password);
        if !(email_ok && password_ok) {
            warn!("Admin login failed");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let issued = tokens.issue(&self.email)?;
        self.record(&issued).await?;

        info!(admin_email = %self.email, expires_at = %issued.expires_at, "Admin session issued");
        Ok(issued)
    }

    /// Validates a token and its tracked session.
    pub async fn authenticate(&self, token: &str) -> Result<AdminIdentity, AdminAuthError> {
        let claims = self
            .tokens()?
            .validate(token)
            .map_err(|_| AdminAuthError::InvalidSession)?;

        let session: AdminSession = self
            .sessions
            .find_by_jti_hash(&sha256_hex(&claims.jti))
            .await?
            .ok_or(AdminAuthError::InvalidSession)?
            .into();

        if !session.is_usable_at(Utc::now()) {
            return Err(AdminAuthError::InvalidSession);
        }

        Ok(AdminIdentity {
            email: session.admin_email,
            jti: claims.jti,
        })
    }

    /// Revokes the caller's session.
    pub async fn logout(&self, identity: &AdminIdentity) -> Result<(), AdminAuthError> {
        if self.sessions.revoke(&sha256_hex(&identity.jti)).await? {
            info!(admin_email = %identity.email, "Admin session revoked");
        }
        Ok(())
    }

    /// Replaces the caller's session with a fresh one. A session can be
    /// rotated only once.
    pub async fn refresh(&self, identity: &AdminIdentity) -> Result<IssuedToken, AdminAuthError> {
        let issued = self.tokens()?.issue(&identity.email)?;

        self.sessions
            .rotate(
                &sha256_hex(&identity.jti),
                &sha256_hex(&issued.jti),
                &identity.email,
                issued.issued_at,
                issued.expires_at,
            )
            .await?
            .ok_or(AdminAuthError::InvalidSession)?;

        info!(admin_email = %identity.email, "Admin session rotated");
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn gate(tokens: Option<Arc<SessionTokens>>) -> AdminGate {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let config = AdminConfig {
            email: "Admin@Example.com".to_string(),
            password: "correct horse battery staple".to_string(),
            session_secret: String::new(),
            session_lifetime_secs: 3600,
            leeway_secs: 0,
        };
        AdminGate::new(pool, &config, tokens)
    }

    fn tokens() -> Arc<SessionTokens> {
        Arc::new(SessionTokens::new("a-test-secret-that-is-at-least-32-bytes", 3600, 0).unwrap())
    }

    #[tokio::test]
    async fn test_login_without_signing_secret_is_not_configured() {
        let err = gate(None)
            .login("admin@example.com", "correct horse battery staple")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::NotConfigured));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected_before_storage() {
        let err = gate(Some(tokens()))
            .login("admin@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_wrong_email_rejected_before_storage() {
        let err = gate(Some(tokens()))
            .login("someone@example.com", "correct horse battery staple")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid_session() {
        let err = gate(Some(tokens()))
            .authenticate("not-a-jwt")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::InvalidSession));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_invalid_session() {
        let other = SessionTokens::new("another-secret-that-is-at-least-32-bytes", 3600, 0).unwrap();
        let issued = other.issue("admin@example.com").unwrap();
        let err = gate(Some(tokens()))
            .authenticate(&issued.token)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::InvalidSession));
    }
}
