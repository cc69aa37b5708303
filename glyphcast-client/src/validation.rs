//! Client-side pre-submit validation.
//!
//! The service enforces all of these rules too; validating locally just
//! fails fast with a clearer message. Nothing here may be relied on to
//! bypass server checks.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field is empty: {field}")]
    MissingField { field: &'static str },
    #[error("chat content must contain only symbolic characters, found {found:?}")]
    NotSymbolic { found: char },
    #[error("vote value must be +1 or -1, got {0}")]
    InvalidVoteValue(i64),
}

pub type ValidationResult = Result<(), ValidationError>;

/// Validate that a value is non-empty after trimming.
pub trait ValidateNonEmpty {
    fn validate_non_empty(&self, field: &'static str) -> ValidationResult;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field: &'static str) -> ValidationResult {
        if self.trim().is_empty() {
            return Err(ValidationError::MissingField { field });
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field: &'static str) -> ValidationResult {
        self.as_str().validate_non_empty(field)
    }
}

/// Chat content on the coordination channel must be purely symbolic: no
/// alphanumeric glyphs and no ASCII punctuation. Whitespace between symbols
/// is allowed.
pub fn validate_chat_content(content: &str) -> ValidationResult {
    content.validate_non_empty("content")?;
    for c in content.chars() {
        if c.is_whitespace() {
            continue;
        }
        if c.is_alphanumeric() || c.is_ascii_punctuation() {
            return Err(ValidationError::NotSymbolic { found: c });
        }
    }
    Ok(())
}

/// A signed vote carries exactly +1 or -1.
pub fn validate_vote_value(value: i64) -> ValidationResult {
    if value == 1 || value == -1 {
        Ok(())
    } else {
        Err(ValidationError::InvalidVoteValue(value))
    }
}
