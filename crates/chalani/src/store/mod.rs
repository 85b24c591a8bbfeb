//! SQLite persistence. `Store` owns the connection and exposes typed
//! operations per entity; the schema is created by idempotent migrations
//! at open time.

mod branches;
mod dashboard;
mod employees;
mod letters;
mod offices;
mod products;
mod receivers;
mod schema;
mod tokens;
mod users;

pub use dashboard::DashboardSnapshot;
pub use employees::{BranchLoadEntry, RoleLoadEntry};
pub use products::{CompanyStatEntry, ImportReport};

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::domain::{LetterStatus, RecordStatus};

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("stored row is corrupt: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// The registry database. A single connection behind a mutex is plenty for
/// an administrative workload and keeps writes serialized.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (and migrate) a database file on disk. `:memory:` opens an
    /// in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::open_in_memory();
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests, ephemeral demos).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let guard = self.conn.lock().expect("store mutex poisoned");
        f(&guard)
    }
}

pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt(format!("bad timestamp '{raw}': {err}")))
}

pub(crate) fn parse_record_status(raw: &str) -> Result<RecordStatus, StoreError> {
    RecordStatus::parse(raw).map_err(|_| StoreError::Corrupt(format!("bad record status '{raw}'")))
}

pub(crate) fn parse_letter_status(raw: &str) -> Result<LetterStatus, StoreError> {
    LetterStatus::parse(raw).map_err(|_| StoreError::Corrupt(format!("bad letter status '{raw}'")))
}
