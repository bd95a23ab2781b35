//! Payment approval state machine.
//!
//! Decides what an approve or reject request does to a ledger row given its
//! current status. The workflow service applies the decision inside a
//! transaction after locking the row.

use thiserror::Error;

use crate::models::package::{self, CatalogError, Currency, Package};
use crate::models::payment::{Payment, PaymentStatus};

/// Who is approving a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalActor {
    /// An authenticated admin session.
    Admin { email: String },
    /// A provider confirmation that passed its trust check.
    Provider { method: &'static str },
}

impl ApprovalActor {
    /// Value stored in the ledger's `approved_by` column.
    pub fn label(&self) -> String {
        match self {
            ApprovalActor::Admin { email } => format!("admin:{}", email),
            ApprovalActor::Provider { method } => format!("provider:{}", method),
        }
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, ApprovalActor::Provider { .. })
    }
}

/// Outcome of an approve request against a locked row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision<'a> {
    /// Transition to approved and grant the package.
    Approve(&'a Package),
    /// The row is already approved; return it without extending the grant.
    AlreadyApproved,
}

/// Outcome of a reject request against a locked row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionDecision {
    Reject,
    AlreadyRejected,
}

/// Transition refused by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Payment is already {0}")]
    AlreadyProcessed(PaymentStatus),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Decides how to approve `payment`.
///
/// Approved rows are a no-op so duplicate provider callbacks are harmless.
/// Pending rows must match the catalog price and duration for their package.
pub fn decide_approval(payment: &Payment) -> Result<ApprovalDecision<'static>, TransitionError> {
    match payment.status {
        PaymentStatus::Approved => Ok(ApprovalDecision::AlreadyApproved),
        PaymentStatus::Failed | PaymentStatus::Expired => {
            Err(TransitionError::AlreadyProcessed(payment.status))
        }
        PaymentStatus::Pending => {
            let package = package::verify_claim(
                &payment.package_name,
                payment.amount_minor,
                payment.currency,
                payment.duration_hours,
            )?;
            Ok(ApprovalDecision::Approve(package))
        }
    }
}

/// Checks a provider-confirmed amount against the amount recorded on the row.
///
/// The row amount is itself checked against the catalog by [`decide_approval`],
/// so together they tie the provider's figure to the package price.
pub fn verify_confirmed_amount(
    payment: &Payment,
    confirmed_minor: i64,
    confirmed_currency: Currency,
) -> Result<(), CatalogError> {
    if confirmed_currency != payment.currency || confirmed_minor != payment.amount_minor {
        return Err(CatalogError::AmountMismatch {
            package: payment.package_name.clone(),
            currency: confirmed_currency,
            claimed: confirmed_minor,
            expected: payment.amount_minor,
        });
    }
    Ok(())
}

/// Decides how to reject `payment`.
pub fn decide_rejection(payment: &Payment) -> Result<RejectionDecision, TransitionError> {
    match payment.status {
        PaymentStatus::Pending => Ok(RejectionDecision::Reject),
        PaymentStatus::Failed => Ok(RejectionDecision::AlreadyRejected),
        PaymentStatus::Approved | PaymentStatus::Expired => {
            Err(TransitionError::AlreadyProcessed(payment.status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::{PaymentMethod, PaymentOrigin};
    use chrono::Utc;
    use uuid::Uuid;

    fn payment(status: PaymentStatus, amount_minor: i64, duration_hours: i64) -> Payment {
        let now = Utc::now();
        Payment {
            id: Uuid::new_v4(),
            user_email: "user@example.com".to_string(),
            method: PaymentMethod::Manual,
            origin: PaymentOrigin::Client,
            amount_minor,
            currency: Currency::Kes,
            phone: None,
            counterparty_reference: "QWE123".to_string(),
            idempotency_key: None,
            package_name: "Daily Package".to_string(),
            duration_hours,
            status,
            failure_reason: None,
            provider_receipt: None,
            raw_provider_payload: None,
            approved_by: None,
            created_at: now,
            approved_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_matching_catalog_approves() {
        let p = payment(PaymentStatus::Pending, 83_300, 24);
        match decide_approval(&p).unwrap() {
            ApprovalDecision::Approve(package) => assert_eq!(package.duration_hours, 24),
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_already_approved_is_noop() {
        let p = payment(PaymentStatus::Approved, 83_300, 24);
        assert_eq!(decide_approval(&p).unwrap(), ApprovalDecision::AlreadyApproved);
    }

    #[test]
    fn test_failed_and_expired_cannot_be_approved() {
        for status in [PaymentStatus::Failed, PaymentStatus::Expired] {
            let p = payment(status, 83_300, 24);
            assert_eq!(
                decide_approval(&p).unwrap_err(),
                TransitionError::AlreadyProcessed(status)
            );
        }
    }

    #[test]
    fn test_amount_mismatch_refused() {
        let p = payment(PaymentStatus::Pending, 100, 24);
        assert!(matches!(
            decide_approval(&p).unwrap_err(),
            TransitionError::Catalog(CatalogError::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_duration_mismatch_refused() {
        let p = payment(PaymentStatus::Pending, 83_300, 720);
        assert!(matches!(
            decide_approval(&p).unwrap_err(),
            TransitionError::Catalog(CatalogError::DurationMismatch { .. })
        ));
    }

    #[test]
    fn test_confirmed_amount_must_match_row() {
        let p = payment(PaymentStatus::Pending, 83_300, 24);
        assert!(verify_confirmed_amount(&p, 83_300, Currency::Kes).is_ok());
        assert!(verify_confirmed_amount(&p, 100, Currency::Kes).is_err());
        assert!(verify_confirmed_amount(&p, 83_300, Currency::Usd).is_err());
    }

    #[test]
    fn test_rejection_decisions() {
        assert_eq!(
            decide_rejection(&payment(PaymentStatus::Pending, 1, 24)).unwrap(),
            RejectionDecision::Reject
        );
        assert_eq!(
            decide_rejection(&payment(PaymentStatus::Failed, 1, 24)).unwrap(),
            RejectionDecision::AlreadyRejected
        );
        assert!(decide_rejection(&payment(PaymentStatus::Approved, 1, 24)).is_err());
        assert!(decide_rejection(&payment(PaymentStatus::Expired, 1, 24)).is_err());
    }

    #[test]
    fn test_actor_labels() {
        let admin = ApprovalActor::Admin {
            email: "admin@example.com".to_string(),
        };
        assert_eq!(admin.label(), "admin:admin@example.com");
        assert!(!admin.is_provider());

        let provider = ApprovalActor::Provider { method: "mobile_money" };
        assert_eq!(provider.label(), "provider:mobile_money");
        assert!(provider.is_provider());
    }
}
