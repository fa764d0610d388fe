//! # API Context
//!
//! Application state and dependency injection for resolvers and handlers.

use std::sync::Arc;

use vax_analytics::AnalyticsEngine;
use vax_domain::CountryId;
use vax_interchange::CsvImporter;
use vax_persistence::{InMemoryObservationStore, ObservationStore};

use crate::config::Config;
use crate::error::ApiResult;

/// Application context shared across all resolvers and REST handlers
#[derive(Clone)]
pub struct ApiContext {
    /// Observation store
    pub store: Arc<dyn ObservationStore>,

    /// Read-only analytics over the store
    pub engine: AnalyticsEngine,

    /// CSV import adapter writing into the store
    pub importer: CsvImporter,

    /// Countries used when a query omits its list
    pub default_countries: Vec<CountryId>,
}

impl ApiContext {
    /// Create a new API context over `store`
    #[must_use]
    pub fn new(store: Arc<dyn ObservationStore>, default_countries: Vec<CountryId>) -> Self {
        Self {
            engine: AnalyticsEngine::new(store.clone()),
            importer: CsvImporter::new(store.clone()),
            store,
            default_countries,
        }
    }

    /// Context backed by an empty in-memory store
    #[must_use]
    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryObservationStore::new()),
            config.default_countries.clone(),
        )
    }

    /// Parse the requested countries, or fall back to the defaults when the
    /// request names none.
    ///
    /// # Errors
    ///
    /// Returns an `INVALID_ARGUMENT` error for an empty identifier.
    pub fn countries_or_default(&self, requested: Option<Vec<String>>) -> ApiResult<Vec<CountryId>> {
        match requested {
            Some(list) if !list.is_empty() => parse_countries(&list),
            _ => Ok(self.default_countries.clone()),
        }
    }
}

/// Parse every identifier, keeping order and duplicates.
///
/// # Errors
///
/// Returns an `INVALID_ARGUMENT` error for an empty identifier.
pub fn parse_countries(raw: &[String]) -> ApiResult<Vec<CountryId>> {
    raw.iter()
        .map(|c| CountryId::parse(c).map_err(Into::into))
        .collect()
}
