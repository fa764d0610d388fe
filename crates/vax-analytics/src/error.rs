//! Analytics error types.

use thiserror::Error;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Rejected precondition, raised before any computation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store query failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] vax_persistence::PersistenceError),

    /// Invalid domain value
    #[error(transparent)]
    Domain(#[from] vax_domain::DomainError),

    /// Report serialization failed
    #[error("Data conversion error: {0}")]
    Conversion(String),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
