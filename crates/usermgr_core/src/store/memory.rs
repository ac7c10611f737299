//! In-process key-value store.
//!
//! Backs tests and previews. Read and write failures can be injected to
//! exercise registry recovery paths, and successful writes are counted.

use super::{KeyValueStore, StoreError, StoreResult};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.borrow_mut().insert(key.into(), value.into());
        store
    }

    /// Makes subsequent reads fail with `StoreError::Unavailable`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Makes subsequent writes fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Returns the raw stored value, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads.get() {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::store::{KeyValueStore, StoreError};

    #[test]
    fn read_absent_key_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read("missing").unwrap(), None);
    }

    #[test]
    fn write_then_read_returns_value() {
        let store = MemoryStore::new();
        store.write("k", "v1").unwrap();
        store.write("k", "v2").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn injected_write_failure_leaves_previous_value() {
        let store = MemoryStore::with_entry("k", "kept");
        store.set_fail_writes(true);

        let err = store.write("k", "lost").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.raw("k").as_deref(), Some("kept"));
        assert_eq!(store.write_count(), 0);
    }
}
