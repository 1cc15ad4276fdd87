//! In-memory storage backend.

use std::collections::HashMap;

use super::KeyValueStorage;
use crate::{Error, Result};

/// Map-backed storage with an optional size quota.
///
/// The quota counts the bytes of every key and value held after a write,
/// so an oversized write fails the way a full browser storage area does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStorage {
    /// Create an empty storage with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage that holds at most `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Seed a value without counting it as a write.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    /// Change or lift the quota.
    pub const fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Borrow the value stored under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }

    /// Number of successful writes since creation.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }

    fn usage_after(&self, key: &str, value: &str) -> usize {
        let others: usize = self
            .slots
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let needed = self.usage_after(key, value);
            if needed > quota {
                return Err(Error::QuotaExceeded { needed, quota });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let mut storage = MemoryStorage::new();
        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn seeded_value_not_counted() {
        let storage = MemoryStorage::new().with_value("k", "[]");
        assert_eq!(storage.value("k"), Some("[]"));
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let mut storage = MemoryStorage::with_quota(8);
        storage.set("k", "1234567").unwrap();

        let err = storage.set("k", "12345678").unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { needed: 9, quota: 8 }));
        assert_eq!(storage.value("k"), Some("1234567"));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn quota_counts_other_keys() {
        let mut storage = MemoryStorage::with_quota(10).with_value("a", "1234");
        assert!(storage.set("b", "12345").is_err());
        storage.set_quota(None);
        storage.set("b", "12345").unwrap();
    }
}
