//! Subscription grant arithmetic.
//!
//! Grants stack: approving a payment while a grant is still running extends
//! the remaining time instead of restarting it. These functions are pure so
//! the persistence layer can apply them under a row lock.

use chrono::{DateTime, Duration, Utc};

use crate::models::subscription::{InactiveReason, SubscriptionCheck, SubscriptionGrant};

/// Computes the expiry after granting `duration_hours` at `now`.
///
/// The grant starts from the existing expiry when it is still in the future,
/// otherwise from `now`.
pub fn compute_expiry(
    existing_expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration_hours: i64,
) -> DateTime<Utc> {
    let base = match existing_expiry {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    base + Duration::hours(duration_hours)
}

/// A grant is active strictly before its expiry.
pub fn is_active_at(expiry_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expiry_at > now
}

/// Evaluates a user's grant at `now`.
///
/// `grant` is `None` when the user has never had an approved payment.
pub fn evaluate(grant: Option<&SubscriptionGrant>, now: DateTime<Utc>) -> SubscriptionCheck {
    match grant {
        None => SubscriptionCheck::inactive(InactiveReason::NoPackage, None),
        Some(grant) if is_active_at(grant.expiry_at, now) => {
            SubscriptionCheck::active(grant.package_name.clone(), grant.expiry_at)
        }
        Some(grant) => SubscriptionCheck::inactive(InactiveReason::Expired, Some(grant.expiry_at)),
    }
}
