//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a 32-byte secret key
pub fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute HMAC-SHA256 over the concatenation of `parts`
///
/// Each part is length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
pub fn hmac_sha256(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    // A 32-byte key is always accepted by HMAC.
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key).unwrap_or_else(|_| unreachable!());
    for part in parts {
        mac.update(&(part.len() as u64).to_be_bytes());
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Encode bytes as URL-safe base64 without padding (safe to paste anywhere)
pub fn to_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode standard base64 (used for secrets supplied through the environment)
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s.trim())
}

/// Decode a base64 environment secret into a 32-byte key
pub fn key_from_base64(s: &str) -> Result<[u8; 32], KeyError> {
    let bytes = from_base64(s)?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| KeyError::Length(bytes.len()))
}

/// Error decoding a secret key
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Key is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("Key must be 32 bytes, got {0}")]
    Length(usize),
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(24);
        assert_eq!(bytes.len(), 24);
        assert!(bytes.iter().any(|&b| b != 0));
        assert_ne!(random_key(), random_key());
    }

    #[test]
    fn test_base64url_has_no_padding() {
        let encoded = to_base64url(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert_eq!(to_base64url(&[0u8; 24]).len(), 32);
    }

    #[test]
    fn test_key_from_base64() {
        let key = [7u8; 32];
        let encoded = general_purpose::STANDARD.encode(key);
        assert_eq!(key_from_base64(&encoded).unwrap(), key);

        let short = general_purpose::STANDARD.encode([1u8; 16]);
        assert!(matches!(key_from_base64(&short), Err(KeyError::Length(16))));
        assert!(matches!(key_from_base64("***"), Err(KeyError::Encoding(_))));
    }

    #[test]
    fn test_hmac_is_keyed_and_framed() {
        let key = [42u8; 32];
        let mac1 = hmac_sha256(&key, &[b"ab", b"c"]);
        assert_eq!(mac1, hmac_sha256(&key, &[b"ab", b"c"]));
        assert_ne!(mac1, hmac_sha256(&key, &[b"a", b"bc"]));
        assert_ne!(mac1, hmac_sha256(&[43u8; 32], &[b"ab", b"c"]));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2], &[1, 2, 3]));
    }
}
