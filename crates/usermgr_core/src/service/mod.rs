//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and registry calls into screen-level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod user_service;
