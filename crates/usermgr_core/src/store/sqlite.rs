//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Persist opaque string blobs in the `kv_store` table.
//!
//! # Invariants
//! - The owned connection went through `db::open_db*`, so `kv_store` exists.
//! - `write` is an upsert and refreshes `updated_at` (epoch milliseconds).

use super::{KeyValueStore, StoreResult};
use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Key-value adapter owning a migrated SQLite connection.
///
/// Owning the connection keeps the store `Send`, so hosts can park it behind
/// a process-wide mutex.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Wraps a connection returned by `open_db` or `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteKvStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}
