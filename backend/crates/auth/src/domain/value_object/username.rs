//! Username Value Object
//!
//! The username is the public handle of an account. It appears in URLs
//! (`/users/{username}`), as the `author` of reviews and comments, and is
//! one half of the identity a confirmation code is issued for.
//!
//! ## Rules
//! - NFKC normalized and trimmed, case preserved
//! - Comparison is case-sensitive (`Bob` and `bob` are different users)
//! - Letters, digits and `_ . @ + -` only
//! - At most 150 characters
//! - `me` in any case is reserved for the self-service endpoint

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for a username (in characters)
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Path segment of the self-service endpoint, never a valid username
pub const RESERVED_USERNAME: &str = "me";

/// Allowed non-alphanumeric characters
const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '@', '+', '-'];

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when username validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// Empty after normalization
    Empty,

    /// Longer than USERNAME_MAX_LENGTH
    TooLong { length: usize, max: usize },

    /// Contains a character outside the allowed set
    InvalidCharacter { char: char, position: usize },

    /// `me` in any case
    Reserved,
}

impl fmt::Display for UsernameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("This field may not be blank."),
            Self::TooLong { max, .. } => {
                write!(f, "Ensure this field has no more than {max} characters.")
            }
            Self::InvalidCharacter { char, position } => write!(
                f,
                "Enter a valid username. Invalid character '{char}' at position {position}; \
                 only letters, numbers, and @/./+/-/_ are allowed."
            ),
            Self::Reserved => write!(f, "Username '{RESERVED_USERNAME}' is not allowed."),
        }
    }
}

impl std::error::Error for UsernameError {}

// ============================================================================
// Username Value Object
// ============================================================================

/// Validated, normalized username
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Normalize (NFKC, trim) and validate raw input
    pub fn new(input: impl AsRef<str>) -> Result<Self, UsernameError> {
        let normalized = Self::normalize(input);
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// NFKC plus trim without validation, for use as a lookup key
    pub fn normalize(input: impl AsRef<str>) -> String {
        input.as_ref().nfkc().collect::<String>().trim().to_string()
    }

    /// Create from database value (assumes already validated)
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for the reserved self-service segment in any case
    pub fn is_reserved(name: &str) -> bool {
        name.eq_ignore_ascii_case(RESERVED_USERNAME)
    }

    fn validate(name: &str) -> Result<(), UsernameError> {
        if name.is_empty() {
            return Err(UsernameError::Empty);
        }

        let length = name.chars().count();
        if length > USERNAME_MAX_LENGTH {
            return Err(UsernameError::TooLong {
                length,
                max: USERNAME_MAX_LENGTH,
            });
        }

        for (position, ch) in name.chars().enumerate() {
            if !Self::is_valid_char(ch) {
                return Err(UsernameError::InvalidCharacter { char: ch, position });
            }
        }

        if Self::is_reserved(name) {
            return Err(UsernameError::Reserved);
        }

        Ok(())
    }

    /// Word characters plus `. @ + -`
    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Username {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Username {
    type Error = UsernameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

// ============================================================================
// Tests
// ============================================================================
