//! Payment ledger entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Currency, Payment, PaymentMethod, PaymentOrigin, PaymentStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatusDb {
    Pending,
    Approved,
    Expired,
    Failed,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(status: PaymentStatusDb) -> Self {
        match status {
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::Approved => PaymentStatus::Approved,
            PaymentStatusDb::Expired => PaymentStatus::Expired,
            PaymentStatusDb::Failed => PaymentStatus::Failed,
        }
    }
}

impl From<PaymentStatus> for PaymentStatusDb {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => PaymentStatusDb::Pending,
            PaymentStatus::Approved => PaymentStatusDb::Approved,
            PaymentStatus::Expired => PaymentStatusDb::Expired,
            PaymentStatus::Failed => PaymentStatusDb::Failed,
        }
    }
}

/// Database enum for payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethodDb {
    Manual,
    MobileMoney,
    Paypal,
}

impl From<PaymentMethodDb> for PaymentMethod {
    fn from(method: PaymentMethodDb) -> Self {
        match method {
            PaymentMethodDb::Manual => PaymentMethod::Manual,
            PaymentMethodDb::MobileMoney => PaymentMethod::MobileMoney,
            PaymentMethodDb::Paypal => PaymentMethod::Paypal,
        }
    }
}

impl From<PaymentMethod> for PaymentMethodDb {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Manual => PaymentMethodDb::Manual,
            PaymentMethod::MobileMoney => PaymentMethodDb::MobileMoney,
            PaymentMethod::Paypal => PaymentMethodDb::Paypal,
        }
    }
}

/// Database enum for payment origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_origin", rename_all = "lowercase")]
pub enum PaymentOriginDb {
    Client,
    Provider,
}

impl From<PaymentOriginDb> for PaymentOrigin {
    fn from(origin: PaymentOriginDb) -> Self {
        match origin {
            PaymentOriginDb::Client => PaymentOrigin::Client,
            PaymentOriginDb::Provider => PaymentOrigin::Provider,
        }
    }
}

impl From<PaymentOrigin> for PaymentOriginDb {
    fn from(origin: PaymentOrigin) -> Self {
        match origin {
            PaymentOrigin::Client => PaymentOriginDb::Client,
            PaymentOrigin::Provider => PaymentOriginDb::Provider,
        }
    }
}

/// Database row mapping for the payments table.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub user_email: String,
    pub method: PaymentMethodDb,
    pub origin: PaymentOriginDb,
    pub amount_minor: i64,
    pub currency: String,
    pub phone: Option<String>,
    pub counterparty_reference: String,
    pub idempotency_key: Option<String>,
    pub package_name: String,
    pub duration_hours: i64,
    pub status: PaymentStatusDb,
    pub failure_reason: Option<String>,
    pub provider_receipt: Option<String>,
    pub raw_provider_payload: Option<serde_json::Value>,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentEntity> for Payment {
    fn from(entity: PaymentEntity) -> Self {
        Self {
            id: entity.id,
            user_email: entity.user_email,
            method: entity.method.into(),
            origin: entity.origin.into(),
            amount_minor: entity.amount_minor,
            // The column is constrained to known codes.
            currency: entity.currency.parse().unwrap_or(Currency::Kes),
            phone: entity.phone,
            counterparty_reference: entity.counterparty_reference,
            idempotency_key: entity.idempotency_key,
            package_name: entity.package_name,
            duration_hours: entity.duration_hours,
            status: entity.status.into(),
            failure_reason: entity.failure_reason,
            provider_receipt: entity.provider_receipt,
            raw_provider_payload: entity.raw_provider_payload,
            approved_by: entity.approved_by,
            created_at: entity.created_at,
            approved_at: entity.approved_at,
            updated_at: entity.updated_at,
        }
    }
}
