//! In-memory user registry synchronized with a key-value store.
//!
//! # Responsibility
//! - Own the canonical ordered user list for one application instance.
//! - Enforce the duplicate-email invariant on every write.
//!
//! # Invariants
//! - At most one user per email under case-insensitive comparison.
//! - The in-memory list is authoritative; the stored blob may lag behind
//!   after a failed write.

pub mod user_registry;
