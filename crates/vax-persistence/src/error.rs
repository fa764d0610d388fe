//! Persistence layer error types

use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[cfg(feature = "duckdb")]
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Stored row could not be converted: {0}")]
    Conversion(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Blocking store task failed: {0}")]
    Task(String),
}

impl From<vax_domain::DomainError> for PersistenceError {
    fn from(err: vax_domain::DomainError) -> Self {
        Self::Conversion(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
