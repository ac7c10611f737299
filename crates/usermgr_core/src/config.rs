//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve store location, log settings and page size for hosts (FFI, CLI).
//!
//! # Invariants
//! - Resolution never fails; unusable values fall back to defaults.

use crate::logging::default_log_level;
use crate::search::page::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "USERMGR_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "USERMGR_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "USERMGR_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "USERMGR_PAGE_SIZE";

const DEFAULT_DB_FILE_NAME: &str = "usermgr.sqlite3";

/// Resolved host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: non_blank(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: non_blank(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: non_blank(ENV_LOG_DIR).map(PathBuf::from),
            page_size: non_blank(ENV_PAGE_SIZE)
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
        }
    }
}
