//! Domain layer for the Therapy Coach backend.
//!
//! This crate contains:
//! - Domain models (Package catalog, Payment, SubscriptionGrant, wellness records)
//! - Business logic services (approval state machine, grant arithmetic,
//!   provider payload parsing, poll policy, assessment scoring)
//! - The text generation collaborator trait

pub mod models;
pub mod services;
