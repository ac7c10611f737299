//! Flutter-facing FFI surface for the user manager core.

pub mod api;
