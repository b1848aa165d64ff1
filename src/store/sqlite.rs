//! SQLite-backed store.
//!
//! The blind index column carries a UNIQUE constraint; a violating insert
//! comes back from SQLite as `SQLITE_CONSTRAINT_UNIQUE` and is reported as
//! [`StoreError::UniqueViolation`].

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::RecordStore;
use crate::error::StoreError;
use crate::index::BlindIndexValue;
use crate::record::VerificationRecord;
use crate::storage::StorageCiphertext;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS verification_records (
        id TEXT PRIMARY KEY,
        encrypted_identifier TEXT NOT NULL,
        encrypted_name TEXT NOT NULL,
        encrypted_aggregate TEXT NOT NULL,
        blind_index TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

const COLUMNS: &str = "id, encrypted_identifier, encrypted_name, encrypted_aggregate, \
                       blind_index, created_at, updated_at";

/// How long a writer waits on another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A `RecordStore` over one SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::info!(path = %path.display(), "opened record database");
        Self::with_connection(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<VerificationRecord> {
    Ok(VerificationRecord {
        id: row.get(0)?,
        encrypted_identifier: StorageCiphertext::from_encoded(row.get::<_, String>(1)?),
        encrypted_name: StorageCiphertext::from_encoded(row.get::<_, String>(2)?),
        encrypted_aggregate: StorageCiphertext::from_encoded(row.get::<_, String>(3)?),
        blind_index: BlindIndexValue::from_hex(row.get::<_, String>(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl RecordStore for SqliteStore {
    fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let result = conn.execute(
            &format!(
                "INSERT INTO verification_records ({COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                record.id,
                record.encrypted_identifier.as_str(),
                record.encrypted_name.as_str(),
                record.encrypted_aggregate.as_str(),
                record.blind_index.as_str(),
                record.created_at,
                record.updated_at,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(StoreError::UniqueViolation)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_by_index(
        &self,
        index: &BlindIndexValue,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM verification_records WHERE blind_index = ?1"),
                params![index.as_str()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn scan_all(&self) -> Result<Vec<VerificationRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM verification_records ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
