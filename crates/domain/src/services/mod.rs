//! Domain services for the Therapy Coach backend.
//!
//! Services contain business logic that operates on domain models.

pub mod approval;
pub mod assessment;
pub mod grant;
pub mod poll;
pub mod provider_event;
pub mod text_generation;

pub use approval::{
    decide_approval, decide_rejection, verify_confirmed_amount, ApprovalActor, ApprovalDecision,
    RejectionDecision, TransitionError,
};
pub use grant::{compute_expiry, evaluate, is_active_at};
pub use poll::{PaymentStatusResponse, PollOutcome, PollPolicy};
pub use provider_event::{
    parse_mpesa_callback, parse_paypal_order, CallbackParseError, MpesaStkResult,
    PaypalOrderEvent, ProviderEvent,
};
pub use text_generation::{
    generate_or_fallback, DisabledTextGenerator, GenerationError, GenerationRequest,
    MockTextGenerator, TextGenerator,
};
