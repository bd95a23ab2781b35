//! Hashing and secret comparison helpers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a caller-supplied secret against the configured one in constant time.
///
/// Both values are run through HMAC-SHA256 under the expected secret and the
/// resulting tags are compared with `verify_slice`, so the comparison time
/// does not depend on where the inputs first differ or on their lengths.
/// An empty expected secret never matches.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    let Ok(mut expected_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let expected_tag = expected_mac.finalize().into_bytes();

    let Ok(mut provided_mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    provided_mac.update(provided.as_bytes());
    provided_mac.verify_slice(&expected_tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("jti-1"), sha256_hex("jti-1"));
        assert_ne!(sha256_hex("jti-1"), sha256_hex("jti-2"));
    }

    #[test]
    fn test_secrets_match_equal() {
        assert!(secrets_match("callback-secret", "callback-secret"));
    }

    #[test]
    fn test_secrets_match_different() {
        assert!(!secrets_match("callback-secret", "callback-secreT"));
        assert!(!secrets_match("callback-secret", "callback"));
        assert!(!secrets_match("callback-secret", ""));
    }

    #[test]
    fn test_secrets_match_empty_expected_never_matches() {
        assert!(!secrets_match("", ""));
        assert!(!secrets_match("", "anything"));
    }
}
