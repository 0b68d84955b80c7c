//! Error types for filter validation, backend fetches and local persistence.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

/// A filter mutation was rejected before touching any state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// A single backend fetch failed. Scoped to the section that issued it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend rejected {operation}: {message}")]
    Rejected { operation: String, message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },
}

impl BackendError {
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BackendError::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Reading or writing the local record store failed.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record {name}: {reason}")]
    Malformed { name: String, reason: String },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
