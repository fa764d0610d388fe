//! # API Error Types
//!
//! Unified error handling for the GraphQL and REST layers.

use async_graphql::{Error as GraphQLError, ErrorExtensions};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use vax_analytics::AnalyticsError;
use vax_domain::DomainError;
use vax_interchange::{ExportError, ImportError};

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] vax_persistence::PersistenceError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_)
            | Self::InvalidInput(_)
            | Self::Import(ImportError::MissingHeader | ImportError::Header(_))
            | Self::Export(ExportError::UnknownFormat(_)) => StatusCode::BAD_REQUEST,
            Self::Persistence(_)
            | Self::Import(ImportError::Persistence(_))
            | Self::Export(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for GraphQL extensions
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Import(_) => "IMPORT_ERROR",
            Self::Export(_) => "EXPORT_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            DomainError::InvalidDateRange { .. } => Self::InvalidInput(err.to_string()),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            AnalyticsError::Persistence(e) => Self::Persistence(e),
            AnalyticsError::Domain(e) => e.into(),
            AnalyticsError::Conversion(msg) => Self::Internal(msg),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> GraphQLError {
        GraphQLError::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.error_code());
            e.set("status", i32::from(self.status_code().as_u16()));
        })
    }
}

/// Convert any error that maps onto [`ApiError`] into a GraphQL error that
/// carries `code` and `status` extensions.
pub fn graphql_error<E: Into<ApiError>>(err: E) -> GraphQLError {
    let api_error: ApiError = err.into();
    if api_error.status_code().is_server_error() {
        tracing::error!(error = %api_error, "GraphQL request failed");
    }
    api_error.extend()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "REST request failed");
        }
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let err = ApiError::from(AnalyticsError::InvalidArgument("empty".into()));
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(ExportError::UnknownFormat("xml".into()));
        assert_eq!(err.error_code(), "EXPORT_ERROR");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(vax_persistence::PersistenceError::LockPoisoned);
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_domain_errors_map_to_client_errors() {
        let err = ApiError::from(DomainError::InvalidArgument("country".into()));
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_graphql_extensions() {
        let gql = graphql_error(ApiError::InvalidInput("bad date".into()));
        let ext = gql.extensions.expect("extensions set");
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("INVALID_INPUT")));
        assert_eq!(ext.get("status"), Some(&async_graphql::Value::from(400)));
    }
}
