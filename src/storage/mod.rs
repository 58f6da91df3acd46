//! The string-keyed storage the record collections are persisted to.
//!
//! Each collection is written as one JSON array under its own key. A write
//! only counts once reading the key back returns exactly what was written.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::{SqliteStorage, create_key_value_table};

/// The key holding the delivery collection.
pub const DELIVERIES_KEY: &str = "deliveries";
/// The key holding the gas entry collection.
pub const GAS_ENTRIES_KEY: &str = "gas_entries";
/// The suffix of the keys holding records that could not be repaired on load.
pub const UNREPAIRABLE_SUFFIX: &str = "_unrepairable";
/// How many times a write is attempted before giving up.
pub const MAX_SAVE_ATTEMPTS: usize = 3;

/// Errors originating from the storage backend.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PersistenceError {
    /// The backend has no room for the value.
    #[error("storage quota exceeded while writing \"{0}\"")]
    QuotaExceeded(String),

    /// Reading a key straight after writing it gave a different value.
    #[error("the value read back from \"{0}\" does not match what was written")]
    VerificationFailed(String),

    /// The collection could not be converted to or from JSON.
    #[error("could not serialize records as JSON: {0}")]
    Serialization(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(#[from] rusqlite::Error),
}

/// A string-keyed store such as browser local storage or a SQLite table.
///
/// Implementations only ever receive and return snapshots; they never hold
/// references to the in-memory collections.
pub trait Storage {
    /// Get the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove `key` and its value. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Write `value` under `key` and check that it reads back unchanged.
///
/// Up to [MAX_SAVE_ATTEMPTS] attempts are made. A full quota is reported
/// immediately since retrying cannot help.
///
/// # Errors
/// Returns the error from the last attempt.
pub fn save_verified<S: Storage + ?Sized>(
    storage: &mut S,
    key: &str,
    value: &str,
) -> Result<(), PersistenceError> {
    let mut attempt = 1;

    loop {
        let result = storage.set(key, value).and_then(|()| match storage.get(key)? {
            Some(stored) if stored == value => Ok(()),
            _ => Err(PersistenceError::VerificationFailed(key.to_owned())),
        });

        match result {
            Ok(()) => return Ok(()),
            Err(error @ PersistenceError::QuotaExceeded(_)) => {
                tracing::error!("Could not save \"{key}\": {error}");
                return Err(error);
            }
            Err(error) if attempt >= MAX_SAVE_ATTEMPTS => {
                tracing::error!("Could not save \"{key}\" after {attempt} attempts: {error}");
                return Err(error);
            }
            Err(error) => {
                tracing::warn!("Attempt {attempt} to save \"{key}\" failed: {error}, retrying");
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        storage::{MAX_SAVE_ATTEMPTS, MemoryStorage, PersistenceError, Storage, save_verified},
        test_utils::FlakyStorage,
    };

    #[test]
    fn save_verified_writes_value() {
        let mut storage = MemoryStorage::new();

        save_verified(&mut storage, "key", "[1,2,3]").unwrap();

        assert_eq!(storage.get("key"), Ok(Some("[1,2,3]".to_owned())));
    }

    #[test]
    fn save_verified_retries_failed_verification() {
        let mut storage = FlakyStorage::failing_verifications(MAX_SAVE_ATTEMPTS - 1);

        let result = save_verified(&mut storage, "key", "value");

        assert_eq!(result, Ok(()));
        assert_eq!(storage.set_calls, MAX_SAVE_ATTEMPTS);
    }

    #[test]
    fn save_verified_gives_up_after_bounded_attempts() {
        let mut storage = FlakyStorage::failing_verifications(usize::MAX);

        let result = save_verified(&mut storage, "key", "value");

        assert_eq!(
            result,
            Err(PersistenceError::VerificationFailed("key".to_owned()))
        );
        assert_eq!(storage.set_calls, MAX_SAVE_ATTEMPTS);
    }

    #[test]
    fn save_verified_does_not_retry_full_quota() {
        let mut storage = MemoryStorage::with_quota(4);

        let result = save_verified(&mut storage, "key", "too long");

        assert_eq!(
            result,
            Err(PersistenceError::QuotaExceeded("key".to_owned()))
        );
    }
}
