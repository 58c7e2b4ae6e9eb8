//! Embedded SQLite backend for [`KeyValueStore`](super::KeyValueStore).
//!
//! Owns a single two-column relation; values are stored as JSON text and
//! writes are single-row upserts.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::storage::error::{Result, StorageError};

#[derive(Debug)]
pub(crate) struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database at the given absolute path and ensure
    /// the key-value table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StorageError::database(e, format!("open '{}'", path.display())))?;
        Self::create_schema(&conn)?;
        Ok(Self { conn })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS key_value (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e| StorageError::database(e, "create_schema"))?;
        Ok(())
    }

    /// Read every row as (key, serialized value text).
    pub fn load_all(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM key_value ORDER BY key")
            .map_err(|e| StorageError::database(e, "load_all"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| StorageError::database(e, "load_all"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| StorageError::database(e, "load_all"))?;
        Ok(rows)
    }

    /// Insert or update the single row for `key`.
    pub fn upsert(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO key_value (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| StorageError::database(e, format!("upsert '{key}'")))?;
        Ok(())
    }
}
