//! Shared utilities for the Therapy Coach backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Secret comparison and hashing helpers
//! - Password hashing with Argon2id
//! - Admin session tokens
//! - Phone number and money validation

pub mod crypto;
pub mod password;
pub mod session;
pub mod validation;
