//! Local record storage for dashboard state.
//!
//! Records are named JSON documents kept in a single SQLite file:
//! - `local_records` table: name (primary key), value (JSON), updated_at
//!
//! The filter spec lives under the `dashboard-filters` record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use super::models::FilterSpec;
use crate::error::{PersistenceError, PersistenceResult};

/// Name of the record holding the serialized filter spec
pub const FILTERS_RECORD: &str = "dashboard-filters";

/// File name of the record database inside the data directory
pub const RECORDS_DB_FILE: &str = "made-dash.db";

/// A store of named string records
pub trait RecordStore {
    fn read(&self, name: &str) -> PersistenceResult<Option<String>>;
    fn write(&self, name: &str, value: &str) -> PersistenceResult<()>;
}

/// Helper to read a column that might be stored as TEXT or BLOB
fn get_string_or_blob(row: &Row, idx: usize) -> rusqlite::Result<String> {
    match row.get::<_, String>(idx) {
        Ok(s) => Ok(s),
        Err(_) => {
            let blob: Vec<u8> = row.get(idx)?;
            String::from_utf8(blob).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Blob,
                    Box::new(e),
                )
            })
        }
    }
}

/// Record store backed by a SQLite file
pub struct SqliteRecordStore {
    db_path: PathBuf,
}

impl SqliteRecordStore {
    /// Create a store for the database file at `db_path`
    pub fn new(db_path: PathBuf) -> Self {
        SqliteRecordStore { db_path }
    }

    /// Create a store using the default file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(RECORDS_DB_FILE))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open the database, creating the directory and table when missing
    fn open(&self) -> PersistenceResult<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS local_records (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        Ok(conn)
    }
}

impl RecordStore for SqliteRecordStore {
    fn read(&self, name: &str) -> PersistenceResult<Option<String>> {
        if !self.db_path.exists() {
            return Ok(None);
        }
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_records WHERE name = ?1",
                [name],
                |row| get_string_or_blob(row, 0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, name: &str, value: &str) -> PersistenceResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO local_records (name, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![name, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// In-memory record store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map of strings
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordStore for MemoryRecordStore {
    fn read(&self, name: &str) -> PersistenceResult<Option<String>> {
        Ok(self.lock().get(name).cloned())
    }

    fn write(&self, name: &str, value: &str) -> PersistenceResult<()> {
        self.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Serialize a filter spec into its stored JSON form
pub fn serialize_filters(spec: &FilterSpec) -> PersistenceResult<String> {
    Ok(serde_json::to_string(spec)?)
}

/// Parse a stored filter spec, rejecting anything that violates its invariants
pub fn deserialize_filters(value: &str) -> PersistenceResult<FilterSpec> {
    serde_json::from_str(value).map_err(|e| PersistenceError::Malformed {
        name: FILTERS_RECORD.to_string(),
        reason: e.to_string(),
    })
}

/// Load the persisted filter spec, falling back to the default for `today`.
///
/// Missing, unreadable and malformed records all yield the default.
pub fn load_filters(store: &dyn RecordStore, today: NaiveDate) -> FilterSpec {
    let restored = store
        .read(FILTERS_RECORD)
        .and_then(|value| value.map(|v| deserialize_filters(&v)).transpose());

    match restored {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            debug!("No persisted filters, using defaults");
            FilterSpec::default_for(today)
        }
        Err(e) => {
            debug!(error = %e, "Discarding persisted filters, using defaults");
            FilterSpec::default_for(today)
        }
    }
}

/// Write the filter spec. Failures are logged and otherwise ignored.
pub fn save_filters(store: &dyn RecordStore, spec: &FilterSpec) {
    let result = serialize_filters(spec).and_then(|value| store.write(FILTERS_RECORD, &value));
    if let Err(e) = result {
        warn!(error = %e, "Failed to persist filters");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::DateRange;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_round_trip_full_spec() {
        let spec = FilterSpec::default()
            .with_date_range(Some(DateRange::new(date("2024-01-01"), date("2024-03-31")).unwrap()))
            .with_repositories(Some(vec![3, 1, 2]))
            .with_squad(Some("platform".to_string()));
        let json = serialize_filters(&spec).unwrap();
        assert_eq!(deserialize_filters(&json).unwrap(), spec);
    }

    #[test]
    fn test_round_trip_empty_spec() {
        let spec = FilterSpec::default();
        let json = serialize_filters(&spec).unwrap();
        assert_eq!(deserialize_filters(&json).unwrap(), spec);
    }

    #[test]
    fn test_stored_format() {
        let spec = FilterSpec::default()
            .with_date_range(Some(DateRange::new(date("2024-01-01"), date("2024-01-31")).unwrap()))
            .with_repositories(Some(vec![2, 1]))
            .with_user(Some(42));
        let value: serde_json::Value = serde_json::from_str(&serialize_filters(&spec).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "dateRange": {"start": "2024-01-01", "end": "2024-01-31"},
                "repositoryIds": [1, 2],
                "squadId": null,
                "userId": 42
            })
        );
    }

    #[test]
    fn test_load_missing_record_uses_default() {
        let store = MemoryRecordStore::new();
        let today = date("2024-06-30");
        assert_eq!(load_filters(&store, today), FilterSpec::default_for(today));
    }

    #[test]
    fn test_load_malformed_record_uses_default() {
        let store = MemoryRecordStore::new();
        store.write(FILTERS_RECORD, "{not json").unwrap();
        let today = date("2024-06-30");
        assert_eq!(load_filters(&store, today), FilterSpec::default_for(today));

        store
            .write(FILTERS_RECORD, r#"{"dateRange":{"start":"soon","end":"later"}}"#)
            .unwrap();
        assert_eq!(load_filters(&store, today), FilterSpec::default_for(today));
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::in_dir(&dir.path().join("nested"));

        assert_eq!(store.read(FILTERS_RECORD).unwrap(), None);

        store.write(FILTERS_RECORD, "first").unwrap();
        store.write(FILTERS_RECORD, "second").unwrap();
        assert_eq!(store.read(FILTERS_RECORD).unwrap().as_deref(), Some("second"));
        assert!(store.db_path().exists());
    }

    #[test]
    fn test_sqlite_store_reads_blob_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::in_dir(dir.path());
        store.write("other", "x").unwrap();

        let conn = Connection::open(store.db_path()).unwrap();
        conn.execute(
            "INSERT INTO local_records (name, value, updated_at) VALUES (?1, ?2, ?3)",
            params![FILTERS_RECORD, b"{\"userId\":5}".to_vec(), "2024-01-01T00:00:00Z"],
        )
        .unwrap();

        let spec = load_filters(&store, date("2024-06-30"));
        assert_eq!(spec.user_id(), Some(5));
        assert!(spec.date_range().is_none());
    }
}
