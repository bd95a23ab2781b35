//! HTTP route handlers.

pub mod admin;
pub mod assessments;
pub mod chat;
pub mod health;
pub mod mood;
pub mod mpesa;
pub mod packages;
pub mod payments;
pub mod paypal;
pub mod subscription;
pub mod users;
