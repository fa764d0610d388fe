//! Interchange error types

use thiserror::Error;

/// Per-row validation failure. Recorded in the import summary; the batch
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid number in {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Failures that abort a whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV content has no header row")]
    MissingHeader,

    #[error("CSV header could not be read: {0}")]
    Header(#[from] csv::Error),

    #[error("Persistence error: {0}")]
    Persistence(#[from] vax_persistence::PersistenceError),
}

/// Export failures
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
}
