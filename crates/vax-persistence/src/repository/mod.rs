//! # Repository Module
//!
//! Store implementations for observation persistence.

#[cfg(feature = "duckdb")]
pub mod duckdb_impl;
pub mod memory;
pub mod traits;

#[cfg(feature = "duckdb")]
pub use duckdb_impl::DuckDbObservationStore;
pub use memory::InMemoryObservationStore;
pub use traits::{ObservationStore, UpsertOutcome};
