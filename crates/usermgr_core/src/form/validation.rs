//! User form validation rules.
//!
//! # Invariants
//! - Checks run in a fixed order: required fields, email shape, duplicate.
//! - `FormError` display text is shown to users verbatim.

use crate::model::user::UserDraft;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Validation failure for a submitted user form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    MissingFields,
    InvalidEmail,
    DuplicateEmail,
}

impl FormError {
    /// Stable machine-readable code for FFI callers.
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::InvalidEmail => "invalid_email",
            Self::DuplicateEmail => "duplicate_email",
        }
    }
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::MissingFields => "Please fill all fields",
            Self::InvalidEmail => "Please enter a valid email address",
            Self::DuplicateEmail => "User with this email already exists",
        };
        f.write_str(message)
    }
}

impl Error for FormError {}

/// Structural email check: `local@domain.tld` without whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Validates a draft, consulting `is_duplicate` only for well-formed emails.
pub fn validate_user_form(
    draft: &UserDraft,
    is_duplicate: impl FnOnce(&str) -> bool,
) -> Result<(), FormError> {
    if draft.first_name.is_empty() || draft.last_name.is_empty() || draft.email.is_empty() {
        return Err(FormError::MissingFields);
    }
    if !is_valid_email(&draft.email) {
        return Err(FormError::InvalidEmail);
    }
    if is_duplicate(&draft.email) {
        return Err(FormError::DuplicateEmail);
    }
    Ok(())
}
