//! Domain models for the Therapy Coach backend.

pub mod admin;
pub mod assessment;
pub mod chat;
pub mod mood;
pub mod package;
pub mod payment;
pub mod report;
pub mod subscription;
pub mod user;

pub use package::{Currency, Package};
pub use payment::{Payment, PaymentMethod, PaymentOrigin, PaymentStatus};
pub use subscription::{GrantStatus, SubscriptionCheck, SubscriptionGrant};
pub use user::User;
