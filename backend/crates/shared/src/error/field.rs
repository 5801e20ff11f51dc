//! Field Errors - per-field validation messages
//!
//! Validation failures are reported field by field, e.g.
//! `{"username": ["This field is required."], "email": ["..."]}`.
//! [`FieldErrors`] accumulates those messages so one request can report
//! every bad field at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Message used for absent mandatory fields
pub const REQUIRED: &str = "This field is required.";

/// Field name used for errors that do not belong to a single field
pub const NON_FIELD: &str = "non_field_errors";

/// Ordered map of field name to validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a map with a single message
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::field::FieldErrors;
    /// let errors = FieldErrors::single("year", "Year cannot be in the future.");
    /// assert_eq!(errors.messages("year"), ["Year cannot be in the future."]);
    /// ```
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Record [`REQUIRED`] against a field
    pub fn required(&mut self, field: impl Into<String>) {
        self.add(field, REQUIRED);
    }

    /// Move every message of `other` into `self`
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Run a validation and keep its value, or record its message
    ///
    /// Lets a use case validate every field before bailing out.
    pub fn check<T, E: fmt::Display>(
        &mut self,
        field: &str,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field (empty when none)
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, `Err(self)` otherwise
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
