//! Key-value storage adapters backing the user registry.
//!
//! # Responsibility
//! - Define the minimal get/set contract the registry needs from its host.
//! - Provide in-memory and SQLite-backed implementations.
//!
//! # Invariants
//! - Adapters store opaque UTF-8 strings; they never interpret the blob.
//! - `read` returns `Ok(None)` for absent keys, never an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage adapter failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Adapter cannot serve requests right now.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Host-supplied key-value capability.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).write(key, value)
    }
}
