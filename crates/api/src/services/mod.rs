//! Application services and outbound integrations.

pub mod admin_gate;
pub mod payments;
pub mod providers;
pub mod text_generation;

pub use admin_gate::{AdminAuthError, AdminGate, AdminIdentity};
pub use payments::{
    ApprovalOutcome, PaymentError, PaymentService, ProviderConfirmation, ProviderOutcome,
    RejectionOutcome,
};
pub use providers::{MpesaClient, PaypalClient, ProviderError};
pub use text_generation::build_text_generator;
