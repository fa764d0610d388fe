//! # Repository Traits
//!
//! Abstract store interface for observations.
//! Implementations can be swapped for different backends (DuckDB, in-memory, etc.)

use async_trait::async_trait;

use crate::error::Result;
use vax_domain::{CountryId, Observation, ObservationFilter};

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

// =============================================================================
// OBSERVATION STORE
// =============================================================================

/// Store of per-region daily observations keyed by `(country, region, date)`.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Observations matching the filter, newest date first, then by country
    /// and region (national rows first).
    async fn filter(&self, filter: &ObservationFilter) -> Result<Vec<Observation>>;

    /// Insert or replace the row with the same key. Atomic per row.
    async fn upsert(&self, observation: &Observation) -> Result<UpsertOutcome>;

    /// Upsert each row in turn, returning how many rows were written.
    async fn upsert_batch(&self, observations: &[Observation]) -> Result<usize> {
        let mut count = 0;
        for observation in observations {
            self.upsert(observation).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Distinct country identifiers present in the store, ascending.
    async fn countries(&self) -> Result<Vec<CountryId>>;
}

/// Ordering shared by every backend for `filter` results.
pub(crate) fn sort_for_listing(observations: &mut [Observation]) {
    observations.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.country.cmp(&b.country))
            .then_with(|| a.region.cmp(&b.region))
    });
}
