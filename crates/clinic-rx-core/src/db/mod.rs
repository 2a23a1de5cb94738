//! SQLite storage backend.

mod schema;
mod doctors;
mod medicines;
mod patients;
mod prescriptions;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::RecordId;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Next identifier for a table: one past the current maximum, 1 when empty.
    ///
    /// Deleting the highest row makes its ID available again.
    fn next_id(conn: &Connection, table: Table) -> DbResult<RecordId> {
        let sql = format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", table.name());
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

/// Entity tables, so table names never come from callers.
#[derive(Debug, Clone, Copy)]
enum Table {
    Patients,
    Doctors,
    Medicines,
    Prescriptions,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Patients => "patients",
            Table::Doctors => "doctors",
            Table::Medicines => "medicines",
            Table::Prescriptions => "prescriptions",
        }
    }
}
