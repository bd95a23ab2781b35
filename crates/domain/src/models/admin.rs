//! Admin session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub id: Uuid,
    pub admin_email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AdminSession {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Request payload for admin login.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response carrying a freshly issued admin session token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminTokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl AdminTokenResponse {
    pub fn bearer(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            token_type: "Bearer",
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration, revoked: bool) -> AdminSession {
        let now = Utc::now();
        AdminSession {
            id: Uuid::new_v4(),
            admin_email: "admin@example.com".to_string(),
            issued_at: now,
            expires_at: now + expires_in,
            revoked_at: revoked.then_some(now),
        }
    }

    #[test]
    fn test_session_usable() {
        assert!(session(Duration::hours(1), false).is_usable_at(Utc::now()));
    }

    #[test]
    fn test_revoked_session_unusable() {
        assert!(!session(Duration::hours(1), true).is_usable_at(Utc::now()));
    }

    #[test]
    fn test_expired_session_unusable() {
        let s = session(Duration::hours(1), false);
        assert!(!s.is_usable_at(s.expires_at));
    }
}
