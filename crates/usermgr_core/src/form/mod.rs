//! Form validation shared by every UI entry point.
//!
//! # Responsibility
//! - Validate user drafts before they reach registry mutations.
//! - Produce stable, user-visible inline messages.

pub mod validation;
