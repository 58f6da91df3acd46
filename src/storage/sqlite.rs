//! A storage backend on a SQLite key/value table.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::storage::{PersistenceError, Storage};

/// Storage in the `key_value` table of a SQLite database.
#[derive(Debug)]
pub struct SqliteStorage {
    connection: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns [PersistenceError::SqlError] if the file cannot be opened or the
    /// table cannot be created.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        Self::new(Connection::open(path)?)
    }

    /// Use an existing connection, creating the table if needed.
    ///
    /// # Errors
    /// Returns [PersistenceError::SqlError] if the table cannot be created.
    pub fn new(connection: Connection) -> Result<Self, PersistenceError> {
        create_key_value_table(&connection)?;

        Ok(Self { connection })
    }
}

/// Create the key_value table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_key_value_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS key_value (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.connection
            .query_row(
                "SELECT value FROM key_value WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(PersistenceError::from)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.connection.execute(
            "INSERT INTO key_value (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.connection
            .execute("DELETE FROM key_value WHERE key = ?1", [key])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::storage::{SqliteStorage, Storage};

    fn get_test_storage() -> SqliteStorage {
        let conn = Connection::open_in_memory().unwrap();
        SqliteStorage::new(conn).unwrap()
    }

    #[test]
    fn get_missing_key_is_none() {
        let storage = get_test_storage();

        assert_eq!(storage.get("deliveries"), Ok(None));
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut storage = get_test_storage();

        storage.set("deliveries", "[]").unwrap();

        assert_eq!(storage.get("deliveries"), Ok(Some("[]".to_owned())));
    }

    #[test]
    fn set_replaces_existing_value() {
        let mut storage = get_test_storage();

        storage.set("deliveries", "[]").unwrap();
        storage.set("deliveries", "[{\"id\":\"1\"}]").unwrap();

        assert_eq!(
            storage.get("deliveries"),
            Ok(Some("[{\"id\":\"1\"}]".to_owned()))
        );
    }

    #[test]
    fn remove_deletes_value() {
        let mut storage = get_test_storage();
        storage.set("gas_entries", "[]").unwrap();

        storage.remove("gas_entries").unwrap();

        assert_eq!(storage.get("gas_entries"), Ok(None));
    }

    #[test]
    fn creating_table_twice_is_fine() {
        let conn = Connection::open_in_memory().unwrap();
        super::create_key_value_table(&conn).unwrap();

        assert!(SqliteStorage::new(conn).is_ok());
    }
}
