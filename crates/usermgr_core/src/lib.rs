//! Core domain logic for the user manager.
//! This crate is the single source of truth for user-registry invariants.

pub mod config;
pub mod db;
pub mod form;
pub mod logging;
pub mod model;
pub mod registry;
pub mod search;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use form::validation::{is_valid_email, validate_user_form, FormError};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::user::{User, UserDraft, UserId};
pub use registry::user_registry::{
    PersistStatus, RegistryError, RegistryResult, RemoveOutcome, UserRegistry, USERS_STORAGE_KEY,
};
pub use search::filter::{filter_users, matches_name};
pub use search::page::{PageWindow, DEFAULT_PAGE_SIZE};
pub use service::user_service::{SearchPage, UserService, UserServiceError, UserServiceResult};
pub use store::{KeyValueStore, MemoryStore, SqliteKvStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
