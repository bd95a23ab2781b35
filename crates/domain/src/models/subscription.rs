//! Subscription grant domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Advisory grant status. `expiry_at` is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantStatus::Active => write!(f, "active"),
            GrantStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A user's single subscription grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubscriptionGrant {
    pub user_id: Uuid,
    pub package_name: String,
    pub expiry_at: DateTime<Utc>,
    pub status: GrantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a user has no active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveReason {
    NoUser,
    NoPackage,
    Expired,
}

/// Result of checking a user's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubscriptionCheck {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InactiveReason>,
}

impl SubscriptionCheck {
    pub fn active(package: String, expiry_at: DateTime<Utc>) -> Self {
        Self {
            active: true,
            package: Some(package),
            expiry_at: Some(expiry_at),
            reason: None,
        }
    }

    pub fn inactive(reason: InactiveReason, expiry_at: Option<DateTime<Utc>>) -> Self {
        Self {
            active: false,
            package: None,
            expiry_at,
            reason: Some(reason),
        }
    }
}

/// Request payload for checking a subscription.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckSubscriptionRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_check_serialization() {
        let expiry = Utc::now();
        let json = serde_json::to_value(SubscriptionCheck::active(
            "Daily Package".to_string(),
            expiry,
        ))
        .unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["package"], "Daily Package");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_inactive_check_serialization() {
        let json =
            serde_json::to_value(SubscriptionCheck::inactive(InactiveReason::NoPackage, None))
                .unwrap();
        assert_eq!(json["active"], false);
        assert_eq!(json["reason"], "no_package");
        assert!(json.get("expiry_at").is_none());
    }

    #[test]
    fn test_grant_status_display() {
        assert_eq!(GrantStatus::Active.to_string(), "active");
        assert_eq!(GrantStatus::Inactive.to_string(), "inactive");
    }
}
