//! Repository implementations for database operations.

pub mod admin_session;
pub mod assessment;
pub mod chat;
pub mod mood;
pub mod payment;
pub mod subscription_grant;
pub mod user;

pub use admin_session::AdminSessionRepository;
pub use assessment::AssessmentRepository;
pub use chat::ChatRepository;
pub use mood::MoodRepository;
pub use payment::PaymentRepository;
pub use subscription_grant::SubscriptionGrantRepository;
pub use user::UserRepository;
