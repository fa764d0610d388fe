//! # Vaccination Persistence Library
//!
//! Store layer for per-region daily observations.
//!
//! ## Architecture
//!
//! Consumers depend only on the [`ObservationStore`] trait and receive a
//! concrete backend by injection:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Analytics Engine / Import & Export Adapters         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ObservationStore (trait)                    │
//! │          filter · upsert · upsert_batch · countries          │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   In-memory BTreeMap    │   │           DuckDB             │
//! │  (tests, ephemeral)     │   │   (embedded, on-disk)        │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `duckdb`: Enable the DuckDB backend (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vax_persistence::{DuckDbObservationStore, ObservationStore};
//!
//! let store: Arc<dyn ObservationStore> =
//!     Arc::new(DuckDbObservationStore::open("observations.duckdb")?);
//! let rows = store.filter(&ObservationFilter::all()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod repository;

pub use error::{PersistenceError, Result};
#[cfg(feature = "duckdb")]
pub use repository::DuckDbObservationStore;
pub use repository::{InMemoryObservationStore, ObservationStore, UpsertOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
