//! Database layer for holidays.
//!
//! Provides a unified `Database` struct that owns the SQLite connection
//! and provides access to domain-specific stores.
//!
//! ## Key Types
//!
//! - [`Database`] - Owns the connection; constructed explicitly and passed around
//! - [`Records`] - The authoritative event record collection
//! - [`Accounts`] - Registered accounts and their credential hashes
//! - [`StoreError`] - Validation, not-found, conflict and SQLite failures

mod accounts;
mod error;
mod records;

pub use accounts::{Account, Accounts};
pub use error::StoreError;
pub use records::{EventRecord, NewRecord, RecordPatch, Records};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The main database struct that owns the SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the default location.
    ///
    /// The default location is `~/.local/share/holidays/holidays.db`.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(&Self::default_path())
    }

    /// Open or create a database at a specific path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("holidays")
            .join("holidays.db")
    }

    /// Access the event record store.
    pub fn records(&self) -> Records<'_> {
        let conn = self.conn.lock().expect("Database lock poisoned");
        Records::new(conn)
    }

    /// Access the account store.
    pub fn accounts(&self) -> Accounts<'_> {
        let conn = self.conn.lock().expect("Database lock poisoned");
        Accounts::new(conn)
    }

    /// Close the underlying connection, flushing any pending state.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, e)| StoreError::Database(e))
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                popularity INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                credential_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
    }
}
