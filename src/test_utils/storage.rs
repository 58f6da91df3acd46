//! Storage backends that misbehave on purpose.

use std::collections::HashMap;

use crate::storage::{PersistenceError, Storage};

/// Storage whose first writes read back as something else.
#[derive(Debug, Default)]
pub(crate) struct FlakyStorage {
    values: HashMap<String, String>,
    /// The number of writes that still fail verification.
    pub(crate) remaining_failures: usize,
    /// The number of calls to `set` so far.
    pub(crate) set_calls: usize,
}

impl FlakyStorage {
    pub(crate) fn failing_verifications(count: usize) -> Self {
        Self {
            remaining_failures: count,
            ..Default::default()
        }
    }
}

impl Storage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.set_calls += 1;

        let stored = if self.remaining_failures > 0 {
            self.remaining_failures -= 1;
            format!("{value} (corrupted)")
        } else {
            value.to_owned()
        };

        self.values.insert(key.to_owned(), stored);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.values.remove(key);
        Ok(())
    }
}
