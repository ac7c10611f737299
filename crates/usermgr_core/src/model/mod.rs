//! Domain model for the user registry.
//!
//! # Responsibility
//! - Define the canonical `User` record and its id-less `UserDraft` input.
//!
//! # Invariants
//! - Every user is identified by a stable, system-generated `UserId`.
//! - Email uniqueness is enforced by the registry, not by the model.

pub mod user;
