//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod admin_session;
pub mod payment;
pub mod subscription_grant;
pub mod user;
pub mod wellness;

pub use admin_session::AdminSessionEntity;
pub use payment::{PaymentEntity, PaymentMethodDb, PaymentOriginDb, PaymentStatusDb};
pub use subscription_grant::{GrantStatusDb, SubscriptionGrantEntity};
pub use user::UserEntity;
pub use wellness::{
    AssessmentEntity, ChatMessageEntity, ChatSenderDb, ChatSessionEntity, MoodCountEntity,
    MoodLogEntity, MonthlyCountEntity,
};
