//! SQLite-backed counter store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{CounterError, CounterState, CounterStore};

/// SQLite-backed counter store.
pub struct SqliteCounterStore {
    conn: Mutex<Connection>,
}

impl SqliteCounterStore {
    /// Create a new SQLite counter store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CounterError> {
        let conn = Connection::open(path).map_err(|e| CounterError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite counter store (useful for testing).
    pub fn in_memory() -> Result<Self, CounterError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CounterError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CounterError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                queued_count INTEGER NOT NULL,
                completed_count INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| CounterError::Database(e.to_string()))?;

        Ok(())
    }
}

impl CounterStore for SqliteCounterStore {
    fn load(&self, name: &str) -> Result<Option<CounterState>, CounterError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT queued_count, completed_count FROM counters WHERE name = ?",
            params![name],
            |row| {
                Ok(CounterState {
                    queued_count: row.get::<_, i64>(0)? as u64,
                    completed_count: row.get::<_, i64>(1)? as u64,
                })
            },
        )
        .optional()
        .map_err(|e| CounterError::Database(e.to_string()))
    }

    fn save(&self, name: &str, state: &CounterState) -> Result<(), CounterError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO counters (name, queued_count, completed_count, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET queued_count = ?2, completed_count = ?3, updated_at = ?4",
            params![
                name,
                state.queued_count as i64,
                state.completed_count as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| CounterError::Database(e.to_string()))?;

        Ok(())
    }
}
