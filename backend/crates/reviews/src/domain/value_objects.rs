//! Domain Value Objects
//!
//! Validated field types for catalogue and review data. Error messages are
//! the ones returned to clients under the offending field.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use kernel::id::{CommentId, ReviewId, TermId, TitleId};

// ============================================================================
// Text fields
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("This field may not be blank.")]
    Blank,
    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { max: usize },
}

/// Non-blank text of at most `max` characters (None for unbounded)
pub fn required_text(input: impl Into<String>, max: Option<usize>) -> Result<String, TextError> {
    let value = input.into().trim().to_string();
    if value.is_empty() {
        return Err(TextError::Blank);
    }
    match max {
        Some(max) if value.chars().count() > max => Err(TextError::TooLong { max }),
        _ => Ok(value),
    }
}

/// Category, genre and title names
pub const NAME_MAX_LENGTH: usize = 256;

pub fn name(input: impl Into<String>) -> Result<String, TextError> {
    required_text(input, Some(NAME_MAX_LENGTH))
}

// ============================================================================
// Slug
// ============================================================================

/// URL-safe identifier of a category or genre
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("This field may not be blank.")]
    Empty,
    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { max: usize },
    #[error("Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.")]
    InvalidCharacter,
}

impl Slug {
    pub const MAX_LENGTH: usize = 50;

    pub fn new(input: impl AsRef<str>) -> Result<Self, SlugError> {
        let slug = input.as_ref().trim();
        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        if slug.chars().count() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !slug.chars().all(Self::is_valid_char) {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(slug.to_string()))
    }

    /// Trusted value read back from the database
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Year
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum YearError {
    #[error("Year cannot be later than the current year ({current}).")]
    Future { current: i32 },
    #[error("Ensure this value is a valid year.")]
    OutOfRange,
}

/// Release year; must not lie past the current calendar year
///
/// Takes the wire width so oversized input becomes a field error.
pub fn release_year(year: i64) -> Result<i32, YearError> {
    let current = Utc::now().year();
    if year > i64::from(current) {
        return Err(YearError::Future { current });
    }
    i32::try_from(year).map_err(|_| YearError::OutOfRange)
}

// ============================================================================
// Score
// ============================================================================

/// Review score, 1 to 10 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Ensure this value is greater than or equal to 1.")]
    TooLow,
    #[error("Ensure this value is less than or equal to 10.")]
    TooHigh,
}

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, ScoreError> {
        if value < i64::from(Self::MIN) {
            return Err(ScoreError::TooLow);
        }
        if value > i64::from(Self::MAX) {
            return Err(ScoreError::TooHigh);
        }
        Ok(Self(value as u8))
    }

    /// Trusted value read back from the database (guarded by a CHECK)
    pub fn from_db(value: i16) -> Self {
        Self(value.clamp(i16::from(Self::MIN), i16::from(Self::MAX)) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl From<Score> for i16 {
    fn from(score: Score) -> Self {
        i16::from(score.0)
    }
}
