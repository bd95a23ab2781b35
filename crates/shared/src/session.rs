//! Admin session tokens.
//!
//! Admin sessions are HS256 JWTs signed with a server-side secret. The token
//! carries a `jti` so the persistence layer can track and revoke individual
//! sessions; signature and expiry are checked here.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum secret length accepted for signing admin sessions.
pub const MIN_SECRET_LEN: usize = 32;

/// Role claim carried by every admin session token.
pub const ADMIN_ROLE: &str = "admin";

/// Error type for session token operations.
#[derive(Debug, Error)]
pub enum SessionTokenError {
    #[error("Session secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// Claims of an admin session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin email.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub role: String,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signing and validation keys for admin sessions.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
    leeway_secs: u64,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("lifetime_secs", &self.lifetime_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl SessionTokens {
    pub fn new(secret: &str, lifetime_secs: i64, leeway_secs: u64) -> Result<Self, SessionTokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionTokenError::WeakSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
            leeway_secs,
        })
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issues a session token for the given admin, valid from now.
    pub fn issue(&self, admin_email: &str) -> Result<IssuedToken, SessionTokenError> {
        self.issue_at(admin_email, Utc::now())
    }

    /// Issues a session token as if signed at `now`.
    pub fn issue_at(
        &self,
        admin_email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, SessionTokenError> {
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + Duration::seconds(self.lifetime_secs);

        let claims = AdminClaims {
            sub: admin_email.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            role: ADMIN_ROLE.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionTokenError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            issued_at: now,
            expires_at,
        })
    }

    /// Checks signature, expiry and role, returning the claims.
    pub fn validate(&self, token: &str) -> Result<AdminClaims, SessionTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let data = decode::<AdminClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => SessionTokenError::InvalidToken,
                _ => SessionTokenError::DecodingError(e.to_string()),
            }
        })?;

        if data.claims.role != ADMIN_ROLE {
            return Err(SessionTokenError::InvalidToken);
        }

        Ok(data.claims)
    }
}
