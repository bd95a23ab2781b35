//! Payment ledger and approval workflow.
//!
//! Approval locks the payment row and then the user row inside one
//! transaction, so concurrent approvals for the same user serialize and
//! each extension stacks on the one before it.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use domain::models::package::{self, CatalogError, Currency, Package};
use domain::models::payment::{NewPayment, SubmitManualPaymentRequest, FAILURE_AMOUNT_MISMATCH};
use domain::models::subscription::InactiveReason;
use domain::models::{
    Payment, PaymentMethod, PaymentOrigin, PaymentStatus, SubscriptionCheck, SubscriptionGrant,
};
use domain::services::{
    compute_expiry, decide_approval, decide_rejection, evaluate, verify_confirmed_amount,
    ApprovalActor, ApprovalDecision, PaymentStatusResponse, PollPolicy, ProviderEvent,
    RejectionDecision, TransitionError,
};
use persistence::repositories::{PaymentRepository, SubscriptionGrantRepository, UserRepository};
use shared::crypto::sha256_hex;
use shared::validation::{normalize_email, normalize_msisdn};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::providers::ProviderError;

/// Errors surfaced by the payment workflow.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Payment is already {0}")]
    AlreadyProcessed(PaymentStatus),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Upstream provider error: {0}")]
    UpstreamProvider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<CatalogError> for PaymentError {
    fn from(err: CatalogError) -> Self {
        PaymentError::Validation(err.to_string())
    }
}

impl From<TransitionError> for PaymentError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyProcessed(status) => PaymentError::AlreadyProcessed(status),
            TransitionError::Catalog(catalog) => catalog.into(),
        }
    }
}

/// Amount and receipt a provider reported for a payment.
#[derive(Debug, Clone, Copy)]
pub struct ProviderConfirmation<'a> {
    pub amount_minor: i64,
    pub currency: Currency,
    pub receipt: Option<&'a str>,
    pub payload: Option<&'a serde_json::Value>,
}

/// Result of an approve call.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub payment: Payment,
    pub expiry_at: DateTime<Utc>,
    /// False when the payment had already been approved.
    pub newly_approved: bool,
}

/// Result of a reject call.
#[derive(Debug, Clone)]
pub struct RejectionOutcome {
    pub payment: Payment,
    /// False when the payment had already failed.
    pub newly_rejected: bool,
}

/// Result of applying a provider confirmation to the ledger.
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    Approved(ApprovalOutcome),
    Rejected(RejectionOutcome),
    /// The confirmation did not signal success or failure yet.
    Pending(Payment),
}

/// Payment ledger and subscription operations.
#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    payments: PaymentRepository,
    users: UserRepository,
    grants: SubscriptionGrantRepository,
    poll_policy: PollPolicy,
}

impl PaymentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            payments: PaymentRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            grants: SubscriptionGrantRepository::new(pool.clone()),
            pool,
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    /// Records a user-submitted payment as pending.
    ///
    /// Returns the row and whether it was newly created; a reused idempotency
    /// key returns the original row.
    pub async fn submit_manual(
        &self,
        request: SubmitManualPaymentRequest,
        idempotency_key_hash: Option<String>,
    ) -> Result<(Payment, bool), PaymentError> {
        let user_email = normalize_email(&request.user_email);
        let counterparty_reference = request.counterparty_reference.trim().to_uppercase();
        let amount = request
            .amount
            .filter(|a| *a > 0)
            .ok_or_else(|| PaymentError::Validation("amount must be positive".to_string()))?;

        let package = package::resolve(&request.package_name)?;
        if let Some(duration) = request.duration_hours {
            if duration != package.duration_hours {
                return Err(CatalogError::DurationMismatch {
                    package: package.name.to_string(),
                    claimed: duration,
                    expected: package.duration_hours,
                }
                .into());
            }
        }

        let phone = match request.phone.as_deref() {
            Some(raw) => Some(normalize_msisdn(raw).ok_or_else(|| {
                PaymentError::Validation("phone must be a Kenyan mobile number".to_string())
            })?),
            None => None,
        };

        if self.users.find_by_email(&user_email).await?.is_none() {
            return Err(PaymentError::NotFound("User not found".to_string()));
        }

        let new = NewPayment {
            user_email,
            method: request.method.unwrap_or(PaymentMethod::Manual),
            origin: PaymentOrigin::Client,
            amount_minor: amount.saturating_mul(100),
            currency: Currency::Kes,
            phone,
            counterparty_reference,
            idempotency_key: idempotency_key_hash,
            package_name: package.name.to_string(),
            duration_hours: package.duration_hours,
            raw_provider_payload: None,
        };

        let (entity, created) = self.payments.create_pending(&new).await?;
        let payment: Payment = entity.into();

        if created {
            info!(
                payment_id = %payment.id,
                user_email = %payment.user_email,
                package = %payment.package_name,
                "Manual payment submitted"
            );
        } else {
            info!(payment_id = %payment.id, "Manual payment replayed by idempotency key");
        }

        Ok((payment, created))
    }

    /// Records a pending row for an outbound provider request (STK push, PayPal order).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_provider_request(
        &self,
        method: PaymentMethod,
        reference: &str,
        user_email: &str,
        package: &Package,
        currency: Currency,
        phone: Option<String>,
        payload: serde_json::Value,
    ) -> Result<Payment, PaymentError> {
        let new = NewPayment {
            user_email: normalize_email(user_email),
            method,
            origin: PaymentOrigin::Provider,
            amount_minor: package.price_minor(currency),
            currency,
            phone,
            counterparty_reference: reference.to_string(),
            idempotency_key: None,
            package_name: package.name.to_string(),
            duration_hours: package.duration_hours,
            raw_provider_payload: Some(payload),
        };

        let (entity, created) = self.payments.upsert_provider_pending(&new).await?;
        let payment: Payment = entity.into();
        if created {
            info!(
                payment_id = %payment.id,
                method = %method,
                reference = %reference,
                "Provider payment recorded as pending"
            );
        }
        Ok(payment)
    }

    /// Records a payment pushed by a provider and approves it when the
    /// payload already signals success.
    pub async fn record_provider_push(
        &self,
        event: &ProviderEvent,
        user_email: &str,
        package: &Package,
        payload: &serde_json::Value,
    ) -> Result<ProviderOutcome, PaymentError> {
        let currency = event
            .confirmed_amount()
            .map(|(_, currency)| currency)
            .unwrap_or(Currency::Kes);

        let payment = self
            .record_provider_request(
                event.method(),
                event.reference(),
                user_email,
                package,
                currency,
                None,
                payload.clone(),
            )
            .await?;

        self.apply_provider_event(payment.id, event, payload).await
    }

    /// Applies a parsed provider confirmation to the ledger row `payment_id`.
    pub async fn apply_provider_event(
        &self,
        payment_id: Uuid,
        event: &ProviderEvent,
        payload: &serde_json::Value,
    ) -> Result<ProviderOutcome, PaymentError> {
        let actor = ApprovalActor::Provider {
            method: event.method().as_str(),
        };

        if event.signals_success() {
            let (amount_minor, currency) = event.confirmed_amount().ok_or_else(|| {
                PaymentError::Validation("Provider did not report an amount".to_string())
            })?;
            let confirmation = ProviderConfirmation {
                amount_minor,
                currency,
                receipt: event.receipt(),
                payload: Some(payload),
            };
            let outcome = self.approve(payment_id, &actor, Some(confirmation)).await?;
            return Ok(ProviderOutcome::Approved(outcome));
        }

        match event.failure_reason() {
            Some(reason) => {
                let outcome = self.reject(payment_id, &actor, &reason, Some(payload)).await?;
                Ok(ProviderOutcome::Rejected(outcome))
            }
            None => {
                let payment = self
                    .payments
                    .find_by_id(payment_id)
                    .await?
                    .ok_or_else(|| PaymentError::NotFound("Payment not found".to_string()))?;
                Ok(ProviderOutcome::Pending(payment.into()))
            }
        }
    }

    /// Looks up the provider row a callback refers to.
    pub async fn find_provider_payment(
        &self,
        method: PaymentMethod,
        reference: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        Ok(self
            .payments
            .find_provider_row(method, reference)
            .await?
            .map(Into::into))
    }

    /// All pending rows, newest first.
    pub async fn list_pending(&self) -> Result<Vec<Payment>, PaymentError> {
        let rows = self.payments.list_pending().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Approves a pending payment and extends the user's grant.
    ///
    /// Approving an approved row is a no-op that returns the current expiry.
    pub async fn approve(
        &self,
        payment_id: Uuid,
        actor: &ApprovalActor,
        confirmation: Option<ProviderConfirmation<'_>>,
    ) -> Result<ApprovalOutcome, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let payment: Payment = PaymentRepository::lock_by_id(&mut *tx, payment_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("Payment not found".to_string()))?
            .into();

        let checked = decide_approval(&payment).and_then(|decision| {
            if let (ApprovalDecision::Approve(_), Some(c)) = (decision, confirmation) {
                verify_confirmed_amount(&payment, c.amount_minor, c.currency)?;
            }
            Ok(decision)
        });

        let package = match checked {
            Ok(ApprovalDecision::Approve(package)) => package,
            Ok(ApprovalDecision::AlreadyApproved) => {
                let expiry_at = match UserRepository::lock_by_email(&mut *tx, &payment.user_email)
                    .await?
                {
                    Some(user) => SubscriptionGrantRepository::find_by_user_id_tx(&mut *tx, user.id)
                        .await?
                        .map(|grant| grant.expiry_at),
                    None => None,
                };
                tx.commit().await?;

                info!(payment_id = %payment.id, actor = %actor.label(), "Payment already approved");
                let expiry_at = expiry_at.unwrap_or_else(|| {
                    payment.approved_at.unwrap_or_else(Utc::now)
                        + Duration::hours(payment.duration_hours)
                });
                return Ok(ApprovalOutcome {
                    payment,
                    expiry_at,
                    newly_approved: false,
                });
            }
            Err(TransitionError::Catalog(err)) if actor.is_provider() => {
                let payload = confirmation.and_then(|c| c.payload);
                PaymentRepository::mark_failed(&mut *tx, payment.id, FAILURE_AMOUNT_MISMATCH, payload)
                    .await?;
                tx.commit().await?;
                warn!(
                    payment_id = %payment.id,
                    error = %err,
                    "Provider confirmation does not match the catalog, payment failed"
                );
                return Err(err.into());
            }
            Err(err) => {
                warn!(payment_id = %payment.id, error = %err, "Payment approval refused");
                return Err(err.into());
            }
        };

        let user = UserRepository::lock_by_email(&mut *tx, &payment.user_email)
            .await?
            .ok_or_else(|| PaymentError::NotFound("User not found".to_string()))?;

        // Read after both locks so a waiting approval stacks from when it ran.
        // Postgres keeps microseconds; expiries read back must compare equal.
        let now = Utc::now().trunc_subsecs(6);

        let existing: Option<SubscriptionGrant> =
            SubscriptionGrantRepository::find_by_user_id_tx(&mut *tx, user.id)
                .await?
                .map(Into::into);
        let expiry_at = compute_expiry(
            existing.as_ref().map(|grant| grant.expiry_at),
            now,
            package.duration_hours,
        );

        SubscriptionGrantRepository::upsert(&mut *tx, user.id, package.name, expiry_at).await?;

        let receipt = confirmation.and_then(|c| c.receipt);
        let payload = confirmation.and_then(|c| c.payload);
        let approved: Payment = PaymentRepository::mark_approved(
            &mut *tx,
            payment.id,
            &actor.label(),
            receipt,
            payload,
            now,
        )
        .await?
        .into();

        tx.commit().await?;

        info!(
            payment_id = %approved.id,
            user_email = %approved.user_email,
            package = %package.name,
            actor = %actor.label(),
            expiry_at = %expiry_at,
            "Payment approved"
        );

        Ok(ApprovalOutcome {
            payment: approved,
            expiry_at,
            newly_approved: true,
        })
    }

    /// Marks a pending payment as failed.
    ///
    /// Rejecting a failed row is a no-op that returns it unchanged.
    pub async fn reject(
        &self,
        payment_id: Uuid,
        actor: &ApprovalActor,
        reason: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<RejectionOutcome, PaymentError> {
        let mut tx = self.pool.begin().await?;

        let payment: Payment = PaymentRepository::lock_by_id(&mut *tx, payment_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("Payment not found".to_string()))?
            .into();

        match decide_rejection(&payment)? {
            RejectionDecision::AlreadyRejected => {
                tx.commit().await?;
                Ok(RejectionOutcome {
                    payment,
                    newly_rejected: false,
                })
            }
            RejectionDecision::Reject => {
                let failed: Payment =
                    PaymentRepository::mark_failed(&mut *tx, payment.id, reason, payload)
                        .await?
                        .into();
                tx.commit().await?;

                info!(
                    payment_id = %failed.id,
                    actor = %actor.label(),
                    reason = %reason,
                    "Payment rejected"
                );
                Ok(RejectionOutcome {
                    payment: failed,
                    newly_rejected: true,
                })
            }
        }
    }

    /// Status of the payment identified by a provider reference, transaction
    /// code or idempotency key.
    pub async fn check_status(
        &self,
        reference: &str,
        attempt: Option<u32>,
    ) -> Result<PaymentStatusResponse, PaymentError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PaymentError::Validation("ref is required".to_string()));
        }

        let found = match self
            .payments
            .find_by_reference(reference, &sha256_hex(reference))
            .await?
        {
            Some(row) => Some(row),
            // Manual transaction codes are stored uppercased.
            None => {
                let upper = reference.to_uppercase();
                self.payments
                    .find_by_reference(&upper, &sha256_hex(reference))
                    .await?
            }
        };

        let status = found.map(|row| PaymentStatus::from(row.status));
        let outcome = self.poll_policy.outcome(status, attempt);

        Ok(PaymentStatusResponse {
            reference: reference.to_string(),
            status: outcome,
            poll_again: self
                .poll_policy
                .should_continue(outcome, attempt.unwrap_or(0)),
            poll: self.poll_policy,
        })
    }

    /// Whether `email` holds a live subscription at `now`.
    pub async fn check_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionCheck, PaymentError> {
        let email = normalize_email(email);
        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => return Ok(SubscriptionCheck::inactive(InactiveReason::NoUser, None)),
        };

        let grant: Option<SubscriptionGrant> =
            self.grants.find_by_user_id(user.id).await?.map(Into::into);
        let check = evaluate(grant.as_ref(), now);

        if check.reason == Some(InactiveReason::Expired) {
            self.grants.mark_inactive_if_lapsed(user.id, now).await?;
        }

        Ok(check)
    }
}
