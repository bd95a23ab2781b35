//! Idempotency key header extractor.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use shared::crypto::sha256_hex;

/// The header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Longest accepted key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Idempotency key supplied by the client.
///
/// Only the SHA-256 hash is stored with the ledger row; status polls may
/// quote the original key and are matched through the same hash.
#[derive(Debug, Clone)]
pub struct IdempotencyKey {
    pub original: String,
    pub hash: String,
}

impl IdempotencyKey {
    pub fn new(original: String) -> Self {
        let hash = sha256_hex(&original);
        Self { original, hash }
    }
}

/// Optional idempotency key extractor.
/// Returns `None` if the header is absent or blank.
#[derive(Debug, Clone)]
pub struct OptionalIdempotencyKey(pub Option<IdempotencyKey>);

impl OptionalIdempotencyKey {
    /// Hash to store on the ledger row.
    pub fn hash(&self) -> Option<String> {
        self.0.as_ref().map(|key| key.hash.clone())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalIdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = match parts.headers.get(IDEMPOTENCY_KEY_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| (StatusCode::BAD_REQUEST, "Idempotency-Key must be ASCII"))?
                .trim(),
            None => return Ok(OptionalIdempotencyKey(None)),
        };

        if value.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err((StatusCode::BAD_REQUEST, "Idempotency-Key is too long"));
        }

        let key = Some(value)
            .filter(|s| !s.is_empty())
            .map(|s| IdempotencyKey::new(s.to_string()));

        Ok(OptionalIdempotencyKey(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<OptionalIdempotencyKey, StatusCode> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        OptionalIdempotencyKey::from_request_parts(&mut parts, &())
            .await
            .map_err(|(status, _)| status)
    }

    #[test]
    fn test_idempotency_key_hash_deterministic() {
        let key1 = IdempotencyKey::new("test-key".to_string());
        let key2 = IdempotencyKey::new("test-key".to_string());
        assert_eq!(key1.hash, key2.hash);
        assert_eq!(key1.hash.len(), 64);
        assert_ne!(key1.hash, IdempotencyKey::new("other".to_string()).hash);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let key = extract(None).await.unwrap();
        assert!(key.0.is_none());
        assert!(key.hash().is_none());
    }

    #[tokio::test]
    async fn test_blank_header_ignored() {
        let key = extract(Some("   ")).await.unwrap();
        assert!(key.0.is_none());
    }

    #[tokio::test]
    async fn test_header_trimmed_and_hashed() {
        let key = extract(Some(" pay-123 ")).await.unwrap();
        assert_eq!(key.0.as_ref().unwrap().original, "pay-123");
        assert_eq!(key.hash().unwrap(), sha256_hex("pay-123"));
    }

    #[tokio::test]
    async fn test_oversized_header_rejected() {
        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        assert_eq!(extract(Some(&long)).await.unwrap_err(), StatusCode::BAD_REQUEST);
    }
}
