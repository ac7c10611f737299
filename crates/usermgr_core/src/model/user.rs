//! User domain model.
//!
//! # Responsibility
//! - Define the persisted user record and its JSON wire shape.
//! - Provide the id-less draft used by add/edit flows.
//!
//! # Invariants
//! - `id` is generated by core and never changes after creation.
//! - Serialized field names are camelCase (`firstName`, `lastName`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user record.
pub type UserId = Uuid;

/// Canonical user record held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Generated once at creation time.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Unique within the registry under case-insensitive comparison.
    pub email: String,
}

impl User {
    /// Creates a user from draft fields with a freshly generated ID.
    pub fn new(draft: UserDraft) -> Self {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Creates a user with a caller-provided ID.
    ///
    /// Used when rehydrating records whose identity already exists.
    pub fn with_id(id: UserId, draft: UserDraft) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
        }
    }

    /// Replaces all editable fields, keeping `id` untouched.
    pub fn apply(&mut self, draft: UserDraft) {
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.email = draft.email;
    }

    /// Display name used by list rows and name search.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Editable user fields, without identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Returns a copy with surrounding whitespace trimmed and email lower-cased.
    ///
    /// Mirrors form input handling, where the email field is lower-cased as
    /// the user types.
    pub fn normalized(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
        }
    }
}

/// Case-insensitive email comparison used by the duplicate-email invariant.
pub fn emails_match(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
