//! Confirmation Code State
//!
//! A confirmation code proves control of the email address an account was
//! registered with. The plaintext code only ever travels by mail; the user
//! record keeps an HMAC digest of it, bound to the username.
//!
//! ```text
//! NotIssued ──issue──▶ Issued { digest, issued_at } ──consume──▶ Consumed
//!                        ▲                                         │
//!                        └────────────────issue────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use platform::crypto::{constant_time_eq, hmac_sha256, random_bytes, to_base64url};
use std::fmt;

use crate::domain::value_object::username::Username;

/// Random bytes per code (32 base64url characters)
pub const CODE_BYTES: usize = 24;

/// Plaintext confirmation code
#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    /// Fresh, non-guessable code
    pub fn generate() -> Self {
        Self(to_base64url(&random_bytes(CODE_BYTES)))
    }

    /// Wrap a code submitted by a client
    pub fn from_input(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keyed digest stored in place of the code
    pub fn digest(&self, secret: &[u8; 32], username: &Username) -> CodeDigest {
        CodeDigest(hmac_sha256(
            secret,
            &[username.as_str().as_bytes(), self.0.as_bytes()],
        ))
    }
}

impl fmt::Debug for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfirmationCode(***)")
    }
}

/// HMAC-SHA256 of a confirmation code
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CodeDigest([u8; 32]);

impl CodeDigest {
    pub fn from_db(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Constant-time comparison
    pub fn matches(&self, other: &CodeDigest) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CodeDigest(..)")
    }
}

/// Why a code was rejected
///
/// Callers must not reveal which variant occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfirmationError {
    #[error("No confirmation code has been issued")]
    NotIssued,
    #[error("Confirmation code has already been used")]
    Consumed,
    #[error("Confirmation code does not match")]
    Mismatch,
    #[error("Confirmation code has expired")]
    Expired,
}

/// Confirmation state of a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    NotIssued,
    Issued {
        digest: CodeDigest,
        issued_at: DateTime<Utc>,
    },
    Consumed {
        consumed_at: DateTime<Utc>,
    },
}

impl Confirmation {
    /// New `Issued` state; replaces whatever was there
    pub fn issue(digest: CodeDigest, issued_at: DateTime<Utc>) -> Self {
        Self::Issued { digest, issued_at }
    }

    /// Check a candidate digest
    ///
    /// Returns the stored digest, which the caller must use as the
    /// compare-and-set guard when consuming.
    pub fn verify(
        &self,
        candidate: &CodeDigest,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<CodeDigest, ConfirmationError> {
        match self {
            Self::NotIssued => Err(ConfirmationError::NotIssued),
            Self::Consumed { .. } => Err(ConfirmationError::Consumed),
            Self::Issued { digest, issued_at } => {
                if !digest.matches(candidate) {
                    return Err(ConfirmationError::Mismatch);
                }
                if now - *issued_at > ttl {
                    return Err(ConfirmationError::Expired);
                }
                Ok(*digest)
            }
        }
    }

    /// Move `Issued(expected)` to `Consumed`; false if the state moved on
    pub fn consume(&mut self, expected: &CodeDigest, at: DateTime<Utc>) -> bool {
        match self {
            Self::Issued { digest, .. } if digest == expected => {
                *self = Self::Consumed { consumed_at: at };
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Issued { .. })
    }

    /// Rebuild from the `confirmation_*` columns
    pub fn from_columns(
        digest: Option<&[u8]>,
        issued_at: Option<DateTime<Utc>>,
        consumed_at: Option<DateTime<Utc>>,
    ) -> Self {
        match (digest.and_then(CodeDigest::from_db), issued_at, consumed_at) {
            (Some(digest), Some(issued_at), None) => Self::Issued { digest, issued_at },
            (_, _, Some(consumed_at)) => Self::Consumed { consumed_at },
            _ => Self::NotIssued,
        }
    }

    /// Split into the `confirmation_*` columns
    pub fn to_columns(&self) -> (Option<Vec<u8>>, Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            Self::NotIssued => (None, None, None),
            Self::Issued { digest, issued_at } => (Some(digest.0.to_vec()), Some(*issued_at), None),
            Self::Consumed { consumed_at } => (None, None, Some(*consumed_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [9u8; 32];

    fn bob() -> Username {
        Username::new("bob").unwrap()
    }

    #[test]
    fn test_generated_codes_are_unique_and_url_safe() {
        let a = ConfirmationCode::generate();
        let b = ConfirmationCode::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_digest_is_bound_to_username() {
        let code = ConfirmationCode::generate();
        let alice = Username::new("alice").unwrap();
        assert_eq!(code.digest(&SECRET, &bob()), code.digest(&SECRET, &bob()));
        assert_ne!(code.digest(&SECRET, &bob()), code.digest(&SECRET, &alice));
    }

    #[test]
    fn test_issue_verify_consume() {
        let now = Utc::now();
        let code = ConfirmationCode::generate();
        let digest = code.digest(&SECRET, &bob());
        let mut state = Confirmation::issue(digest, now);

        let guard = state.verify(&digest, now, Duration::days(3)).unwrap();
        assert!(state.consume(&guard, now));
        assert!(!state.is_pending());

        assert_eq!(
            state.verify(&digest, now, Duration::days(3)),
            Err(ConfirmationError::Consumed)
        );
        assert!(!state.consume(&guard, now));
    }

    #[test]
    fn test_wrong_code_is_mismatch() {
        let now = Utc::now();
        let state = Confirmation::issue(ConfirmationCode::generate().digest(&SECRET, &bob()), now);
        let wrong = ConfirmationCode::from_input("wrong").digest(&SECRET, &bob());
        assert_eq!(
            state.verify(&wrong, now, Duration::days(3)),
            Err(ConfirmationError::Mismatch)
        );
    }

    #[test]
    fn test_expired_code() {
        let issued_at = Utc::now() - Duration::days(4);
        let digest = ConfirmationCode::generate().digest(&SECRET, &bob());
        let state = Confirmation::issue(digest, issued_at);
        assert_eq!(
            state.verify(&digest, Utc::now(), Duration::days(3)),
            Err(ConfirmationError::Expired)
        );
    }

    #[test]
    fn test_never_issued() {
        let digest = ConfirmationCode::generate().digest(&SECRET, &bob());
        assert_eq!(
            Confirmation::NotIssued.verify(&digest, Utc::now(), Duration::days(3)),
            Err(ConfirmationError::NotIssued)
        );
    }

    #[test]
    fn test_reissue_after_consume() {
        let now = Utc::now();
        let first = ConfirmationCode::generate().digest(&SECRET, &bob());
        let mut state = Confirmation::issue(first, now);
        assert!(state.consume(&first, now));

        let second = ConfirmationCode::generate().digest(&SECRET, &bob());
        state = Confirmation::issue(second, now);
        assert!(state.verify(&second, now, Duration::days(3)).is_ok());
        assert_eq!(
            state.verify(&first, now, Duration::days(3)),
            Err(ConfirmationError::Mismatch)
        );
    }

    #[test]
    fn test_columns_roundtrip() {
        let now = Utc::now();
        let digest = ConfirmationCode::generate().digest(&SECRET, &bob());
        for state in [
            Confirmation::NotIssued,
            Confirmation::issue(digest, now),
            Confirmation::Consumed { consumed_at: now },
        ] {
            let (d, i, c) = state.to_columns();
            assert_eq!(Confirmation::from_columns(d.as_deref(), i, c), state);
        }
    }

    #[test]
    fn test_debug_hides_secrets() {
        let code = ConfirmationCode::from_input("secret-code");
        assert!(!format!("{code:?}").contains("secret"));
    }
}
