//! An in-memory storage backend.

use std::collections::HashMap;

use crate::storage::{PersistenceError, Storage};

/// Storage backed by a hash map, with an optional size limit.
///
/// Useful for tests and for embedding the store where the host keeps its own
/// copy of the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty storage without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage that holds at most `quota` bytes of keys and
    /// values.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(quota) = self.quota
            && self.used_bytes_without(key) + key.len() + value.len() > quota
        {
            return Err(PersistenceError::QuotaExceeded(key.to_owned()));
        }

        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{MemoryStorage, PersistenceError, Storage};

    #[test]
    fn get_returns_what_was_set() {
        let mut storage = MemoryStorage::new();

        storage.set("a", "1").unwrap();
        storage.set("a", "2").unwrap();

        assert_eq!(storage.get("a"), Ok(Some("2".to_owned())));
        assert_eq!(storage.get("b"), Ok(None));
    }

    #[test]
    fn remove_deletes_key() {
        let mut storage = MemoryStorage::new();
        storage.set("a", "1").unwrap();

        storage.remove("a").unwrap();
        storage.remove("missing").unwrap();

        assert_eq!(storage.get("a"), Ok(None));
    }

    #[test]
    fn quota_counts_keys_and_values() {
        let mut storage = MemoryStorage::with_quota(10);

        storage.set("ab", "12345678").unwrap();
        // Replacing a value only counts the new value.
        storage.set("ab", "87654321").unwrap();

        assert_eq!(
            storage.set("c", "1"),
            Err(PersistenceError::QuotaExceeded("c".to_owned()))
        );
    }
}
