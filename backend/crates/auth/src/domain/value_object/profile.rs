//! Profile Fields
//!
//! Free-form, blank-allowed fields shown on `/users/me`.

use serde::{Deserialize, Serialize};

/// Maximum length for first and last name (in characters)
pub const NAME_MAX_LENGTH: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Ensure this field has no more than {max} characters.")]
pub struct NameTooLong {
    pub max: usize,
}

/// Validate a first or last name
pub fn person_name(input: impl Into<String>) -> Result<String, NameTooLong> {
    let name = input.into().trim().to_string();
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(NameTooLong {
            max: NAME_MAX_LENGTH,
        });
    }
    Ok(name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}
