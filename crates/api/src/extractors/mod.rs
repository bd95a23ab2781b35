//! Custom Axum extractors.

pub mod idempotency_key;

pub use idempotency_key::{IdempotencyKey, OptionalIdempotencyKey, IDEMPOTENCY_KEY_HEADER};
